//! 运行结果.

use iqm_berry::batch::RowFailure;
use iqm_berry::table::MetricsRow;
use std::io::{self, Write};

/// 均值和样本标准差 (除以 N - 1). NaN 被跳过; 没有可用值时二者均为 NaN.
fn mean_std<I: IntoIterator<Item = f64>>(it: I) -> (f64, f64) {
    let values: Vec<f64> = it.into_iter().filter(|v| !v.is_nan()).collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (mean, (sq / (n - 1.0)).sqrt())
}

/// 将一项指标的统计信息写进 `w` 中.
fn describe_into<W: Write, I: IntoIterator<Item = f64>>(
    name: &str,
    values: I,
    w: &mut W,
) -> io::Result<()> {
    let (mean, std) = mean_std(values);
    writeln!(w, "{name}: Mean = {mean}, Std = {std}")
}

/// 一次运行的最终结果.
pub struct QcResult {
    rows: Vec<MetricsRow>,
    failures: Vec<RowFailure>,
    degraded: Vec<RowFailure>,
}

/// 写出一组记录, 为空时不写.
fn list_into<W: Write>(title: &str, records: &[RowFailure], w: &mut W) -> io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    writeln!(w, "{title} ({}):", records.len())?;
    for r in records {
        writeln!(w, "    {r}")?;
    }
    utils::sep_to(&mut *w)
}

impl QcResult {
    pub fn new(rows: Vec<MetricsRow>, failures: Vec<RowFailure>, degraded: Vec<RowFailure>) -> Self {
        Self {
            rows,
            failures,
            degraded,
        }
    }

    /// 写出失败和降级的行, 以及各项指标的统计信息.
    ///
    /// CNR 和 CJV 只统计二者都存在的行.
    pub fn describe_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        list_into("Skipped sessions", &self.failures, w)?;
        list_into("Sessions with empty metrics", &self.degraded, w)?;

        let rows = &self.rows;
        describe_into("EFC", rows.iter().map(|r| r.efc), w)?;
        describe_into("T_SNR", rows.iter().filter_map(|r| r.t_snr), w)?;

        let segs: Vec<&MetricsRow> = rows.iter().filter(|r| r.has_segmentation_metrics()).collect();
        describe_into("CNR", segs.iter().filter_map(|r| r.cnr), w)?;
        describe_into("CJV", segs.iter().filter_map(|r| r.cjv), w)?;
        utils::sep_to(&mut *w)
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let mut buf = Vec::with_capacity(512);
        match self.describe_into(&mut buf) {
            Ok(()) => print!("{}", String::from_utf8_lossy(&buf)),
            Err(e) => log::error!("Failed to describe results: {e}"),
        }
    }
}
