//! MRI 图像质量指标.
//!
//! 四个指标改编自 MRIQC 的 T1w IQMs, 全部以 `f64` 计算并返回完整精度,
//! 舍入只发生在报告路径上 (见 [`crate::table`]).
//!
//! 数值退化不会被当作错误: 空的组织掩码, 零方差, 相等的组织均值等情况下,
//! 函数按公式返回 NaN 或 ±Inf. 只有结构性问题 (配对数组形状不一致) 才返回 `Err`.

use either::Either;
use ndarray::{Array, ArrayView, Dimension};

use crate::consts::EFC_EPSILON;

mod error;
mod stats;
mod tissue;

pub use error::MetricError;
pub use stats::Moments;
pub use tissue::{TissueClass, TissueLabels};

/// 指标计算结果.
pub type MetricResult<T> = Result<T, MetricError>;

/// 检查配对数组形状.
#[inline]
fn check_shape(expected: &[usize], found: &[usize]) -> MetricResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MetricError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}

/// 按行优先序迭代未被 `frame_mask` 排除的体素值.
fn included<'a, D: Dimension + 'a>(
    volume: ArrayView<'a, f64, D>,
    frame_mask: Option<ArrayView<'a, bool, D>>,
) -> impl Iterator<Item = f64> + Clone + 'a {
    match frame_mask {
        None => Either::Left(volume.into_iter().copied()),
        Some(mask) => Either::Right(
            volume
                .into_iter()
                .zip(mask)
                .filter_map(|(v, excluded)| (!*excluded).then_some(*v)),
        ),
    }
}

/// 计算 `volume` 中标签属于 `codes` 的体素强度的矩.
fn masked_moments<D: Dimension>(
    volume: &ArrayView<f64, D>,
    labels: &ArrayView<i32, D>,
    codes: &[i32],
) -> Moments {
    Moments::of(
        volume
            .iter()
            .zip(labels.iter())
            .filter_map(move |(v, l)| codes.binary_search(l).is_ok().then_some(*v)),
    )
}

/// Entropy Focus Criterion (EFC).
///
/// 利用体素强度的 Shannon 熵衡量运动引起的伪影和模糊. 值越低代表图像越 "聚焦":
/// 所有能量集中在单个体素时 EFC 为 0, 所有体素强度相同时达到最大值 1.
///
/// `frame_mask` 中为 `true` 的体素 (例如旋转后插值引入的空体素) 不参与计算,
/// `None` 代表不排除任何体素.
///
/// # 数值退化
///
/// 参与计算的体素少于 2 个时结果为 NaN 或 Inf, 调用者应自行检查.
pub fn entropy_focus_criterion<D: Dimension>(
    volume: ArrayView<f64, D>,
    frame_mask: Option<ArrayView<bool, D>>,
) -> MetricResult<f64> {
    if let Some(mask) = &frame_mask {
        check_shape(volume.shape(), mask.shape())?;
    }
    let values = included(volume.view(), frame_mask.as_ref().map(|m| m.view()));

    let n = values.clone().count() as f64;
    // 所有体素强度相同时取到的最大值.
    let efc_max = n * (1.0 / n.sqrt()) * (1.0 / n.sqrt()).ln();

    // 图像总能量.
    let b_max = values.clone().map(|v| v * v).sum::<f64>().sqrt();

    let sum: f64 = values
        .map(|v| (v / b_max) * ((v + EFC_EPSILON) / b_max).ln())
        .sum();
    Ok((1.0 / efc_max) * sum)
}

/// 解剖 SNR: 均值除以经有限样本修正后的标准差.
///
/// `mean / (std * sqrt(n / (n - 1)))`, 其中 `std` 为总体标准差.
/// 应在颅骨剥离后的体数据上调用, 但函数本身不区分前景背景.
/// 零方差时结果为 ±Inf (均值为 0 时为 NaN), 体素少于 2 个时为 NaN.
pub fn anatomical_snr<D: Dimension>(volume: ArrayView<f64, D>) -> f64 {
    let m = Moments::of(volume.iter().copied());
    let n = m.count as f64;
    m.mean / (m.std * (n / (n - 1.0)).sqrt())
}

/// 白质/灰质之间的 Contrast-to-Noise Ratio (CNR).
///
/// `(mean_wm - mean_gm) / sqrt(std_bg² + std_wm² + std_gm²)`.
///
/// `volume` 应事先经过 min-max 归一化 (见 [`min_max_normalize`]), 该函数不做任何归一化.
/// 任一组织类别没有体素时结果为 NaN.
///
/// 若 `labels` 与 `volume` 形状不一致, 返回 `Err`.
pub fn contrast_to_noise_ratio<D: Dimension>(
    volume: ArrayView<f64, D>,
    labels: ArrayView<i32, D>,
    tissues: &TissueLabels,
) -> MetricResult<f64> {
    check_shape(volume.shape(), labels.shape())?;
    let wm = masked_moments(&volume, &labels, tissues.codes(TissueClass::WhiteMatter));
    let gm = masked_moments(&volume, &labels, tissues.codes(TissueClass::GrayMatter));
    let bg = masked_moments(&volume, &labels, tissues.codes(TissueClass::Background));

    Ok((wm.mean - gm.mean) / (bg.var() + wm.var() + gm.var()).sqrt())
}

/// 白质/灰质之间的 Coefficient of Joint Variation (CJV).
///
/// `(std_wm + std_gm) / |mean_wm - mean_gm|`. 值越低代表组织内部强度越均匀.
/// 两类均值相等时结果为 +Inf (两类标准差也均为 0 时为 NaN), 不做截断.
///
/// 若 `labels` 与 `volume` 形状不一致, 返回 `Err`.
pub fn coefficient_of_joint_variation<D: Dimension>(
    volume: ArrayView<f64, D>,
    labels: ArrayView<i32, D>,
    tissues: &TissueLabels,
) -> MetricResult<f64> {
    check_shape(volume.shape(), labels.shape())?;
    let wm = masked_moments(&volume, &labels, tissues.codes(TissueClass::WhiteMatter));
    let gm = masked_moments(&volume, &labels, tissues.codes(TissueClass::GrayMatter));

    Ok((wm.std + gm.std) / (wm.mean - gm.mean).abs())
}

/// 使用 `volume` 自身的最小/最大值将强度线性缩放到 `[0, 1]`.
///
/// 常数体数据的结果全部为 NaN (`0 / 0`).
pub fn min_max_normalize<D: Dimension>(volume: ArrayView<f64, D>) -> Array<f64, D> {
    let min = volume.iter().copied().fold(f64::INFINITY, f64::min);
    let max = volume.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    volume.mapv(|v| (v - min) / range)
}
