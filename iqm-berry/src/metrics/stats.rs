//! 体素子集的总体矩统计.

/// 一组体素的样本数、均值和总体标准差 (除以 N).
///
/// 空集合的均值和标准差均为 NaN, 与 `0 / 0` 一致.
#[derive(Copy, Clone, Debug)]
pub struct Moments {
    /// 体素个数.
    pub count: usize,

    /// 均值.
    pub mean: f64,

    /// 总体标准差.
    pub std: f64,
}

impl Moments {
    /// 两遍扫描计算矩. `values` 必须可以被重复迭代.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64> + Clone,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        for v in values.clone() {
            count += 1;
            sum += v;
        }
        let n = count as f64;
        let mean = sum / n;

        let sq: f64 = values.into_iter().map(|v| (v - mean) * (v - mean)).sum();
        let std = (sq / n).sqrt();

        Self { count, mean, std }
    }

    /// 方差.
    #[inline]
    pub fn var(&self) -> f64 {
        self.std * self.std
    }
}
