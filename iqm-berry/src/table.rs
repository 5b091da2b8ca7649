//! 指标输出表格.
//!
//! 表格为逗号分隔, 列依次为 `participant_id, session_id, EFC, T_SNR, CNR, CJV`.
//! 缺失的指标写为空字段, 读回时恢复为 `None`. 舍入只发生在写出时.

use crate::consts::columns::{CJV, CNR, EFC, PARTICIPANT_ID, SESSION_ID, T_SNR};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// 表格读写结果.
pub type TableResult<T> = Result<T, csv::Error>;

/// 输出表格的列名, 按列序排列.
pub const COLUMNS: [&str; 6] = [PARTICIPANT_ID, SESSION_ID, EFC, T_SNR, CNR, CJV];

/// 一个 (被试, 会话) 的指标.
///
/// 只有 EFC 一定存在: 缺少颅骨剥离扫描时 `t_snr` 为 `None`,
/// 缺少人工分割时 `cnr` 和 `cjv` 为 `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    /// 被试编号.
    pub participant_id: String,

    /// 会话编号.
    pub session_id: String,

    /// Entropy Focus Criterion.
    #[serde(rename = "EFC")]
    pub efc: f64,

    /// 颅骨剥离扫描上的解剖 SNR.
    #[serde(rename = "T_SNR")]
    pub t_snr: Option<f64>,

    /// 白质/灰质 CNR.
    #[serde(rename = "CNR")]
    pub cnr: Option<f64>,

    /// 白质/灰质 CJV.
    #[serde(rename = "CJV")]
    pub cjv: Option<f64>,
}

/// 将 `v` 舍入到 `decimals` 位小数. 非有限值原样返回.
#[inline]
pub fn round_to(v: f64, decimals: u32) -> f64 {
    let k = 10f64.powi(decimals as i32);
    let scaled = v * k;
    if scaled.is_finite() {
        scaled.round() / k
    } else {
        v
    }
}

impl MetricsRow {
    /// 获取所有指标均舍入到 `decimals` 位小数的副本.
    pub fn rounded(&self, decimals: u32) -> Self {
        let r = |v: f64| round_to(v, decimals);
        Self {
            participant_id: self.participant_id.clone(),
            session_id: self.session_id.clone(),
            efc: r(self.efc),
            t_snr: self.t_snr.map(r),
            cnr: self.cnr.map(r),
            cjv: self.cjv.map(r),
        }
    }

    /// CNR 和 CJV 是否都存在.
    #[inline]
    pub fn has_segmentation_metrics(&self) -> bool {
        self.cnr.is_some() && self.cjv.is_some()
    }
}

/// 将 `rows` 按顺序写入 `w`. `decimals` 为 `Some(d)` 时所有指标舍入到 `d` 位小数.
///
/// 即使 `rows` 为空也会写出表头.
pub fn write_metrics_to<W: io::Write>(
    w: W,
    rows: &[MetricsRow],
    decimals: Option<u32>,
) -> TableResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(COLUMNS)?;
    for row in rows {
        match decimals {
            Some(d) => wtr.serialize(row.rounded(d))?,
            None => wtr.serialize(row)?,
        }
    }
    wtr.flush()?;
    Ok(())
}

/// 将 `rows` 一次性写入 `path`, 覆盖已有文件.
pub fn write_metrics_csv<P: AsRef<Path>>(
    path: P,
    rows: &[MetricsRow],
    decimals: Option<u32>,
) -> TableResult<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_metrics_to(io::BufWriter::new(file), rows, decimals)
}

/// 从 `r` 读取指标表格.
pub fn read_metrics_from<R: io::Read>(r: R) -> TableResult<Vec<MetricsRow>> {
    csv::Reader::from_reader(r).deserialize().collect()
}

/// 从 `path` 读取指标表格.
pub fn read_metrics_csv<P: AsRef<Path>>(path: P) -> TableResult<Vec<MetricsRow>> {
    csv::Reader::from_path(path.as_ref())?.deserialize().collect()
}
