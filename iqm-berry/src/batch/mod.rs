//! 批量计算 cohort 中每个 (被试, 会话) 的图像质量指标.
//!
//! 每行独立处理:
//!
//! 1. 读取解剖扫描 (必需), 按批次统一的 [`Precision`] 转换后计算 EFC;
//! 2. 若存在颅骨剥离扫描, 计算解剖 SNR, 否则 `T_SNR` 为空;
//! 3. 若存在人工分割, 检查形状后将解剖扫描按自身最小/最大值归一化,
//!   计算 CNR 和 CJV, 否则二者为空.
//!
//! 只有解剖扫描缺失或无法读取时才跳过该行. 可选输入存在却无法使用
//! (无法解码, 形状不一致) 时保留该行, 对应指标为空, 并将原因记为降级.
//! 输出行顺序与 cohort 顺序一致.

use log::{debug, info, warn};
use std::path::Path;

use crate::consts::DEFAULT_DECIMALS;
use crate::data::{LoadResult, MriLabel, MriScan, NiftiHeaderAttr, Precision};
use crate::dataset::{BidsLayout, CohortRow, VolumeKind};
use crate::metrics::{
    anatomical_snr, coefficient_of_joint_variation, contrast_to_noise_ratio,
    entropy_focus_criterion, TissueClass, TissueLabels,
};
use crate::table::{self, MetricsRow, TableResult};

mod error;

pub use error::{RowError, RowFailure};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单行处理结果.
pub type RowResult = Result<ProcessedRow, RowError>;

/// 成功处理的一行.
#[derive(Debug)]
pub struct ProcessedRow {
    /// 指标. 无法使用的可选输入对应的指标为空.
    pub metrics: MetricsRow,

    /// 该行被降级的原因, 按发现顺序排列. 为空代表所有存在的输入都参与了计算.
    pub degraded: Vec<RowError>,
}

/// 批量计算配置.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// 文件路径约定.
    pub layout: BidsLayout,

    /// 组织标签编码.
    pub tissues: TissueLabels,

    /// 解剖扫描的体素精度, 整个批次一致.
    pub precision: Precision,

    /// 写出表格时保留的小数位数. `None` 代表不舍入.
    pub decimals: Option<u32>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            layout: BidsLayout::default(),
            tissues: TissueLabels::default(),
            precision: Precision::default(),
            decimals: Some(DEFAULT_DECIMALS),
        }
    }
}

impl BatchConfig {
    /// 替换路径约定.
    pub fn with_layout(mut self, layout: BidsLayout) -> Self {
        self.layout = layout;
        self
    }

    /// 替换组织标签编码.
    pub fn with_tissues(mut self, tissues: TissueLabels) -> Self {
        self.tissues = tissues;
        self
    }

    /// 替换体素精度.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// 替换写出时的小数位数.
    pub fn with_decimals(mut self, decimals: Option<u32>) -> Self {
        self.decimals = decimals;
        self
    }
}

/// 批量计算结果: 成功的行, 失败记录与降级记录, 三者都保持 cohort 顺序.
#[derive(Debug)]
pub struct BatchReport {
    /// 成功计算的行, 包括被降级的行.
    pub rows: Vec<MetricsRow>,

    /// 被跳过的行及原因.
    pub failures: Vec<RowFailure>,

    /// 保留在表格中, 但部分指标因可选输入无法使用而为空的行及原因.
    pub degraded: Vec<RowFailure>,

    decimals: Option<u32>,
}

impl BatchReport {
    /// 按 cohort 顺序整理每行的结果.
    fn collect<'a, I>(outcomes: I, decimals: Option<u32>) -> Self
    where
        I: IntoIterator<Item = (&'a CohortRow, RowResult)>,
    {
        let mut rows = Vec::new();
        let mut failures = Vec::new();
        let mut degraded = Vec::new();
        for (row, outcome) in outcomes {
            match outcome {
                Ok(processed) => {
                    rows.push(processed.metrics);
                    degraded.extend(processed.degraded.into_iter().map(|error| RowFailure {
                        row: row.clone(),
                        error,
                    }));
                }
                Err(error) => {
                    warn!("Skipping {row}: {error}");
                    failures.push(RowFailure {
                        row: row.clone(),
                        error,
                    });
                }
            }
        }
        Self {
            rows,
            failures,
            degraded,
            decimals,
        }
    }

    /// 是否所有行都成功, 且没有被降级的行.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.degraded.is_empty()
    }

    /// 将成功的行一次性写入 `path`, 按配置舍入.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> TableResult<()> {
        table::write_metrics_csv(path, &self.rows, self.decimals)
    }
}

/// 读取可选的体数据. 文件不存在时返回 `Ok(None)`.
fn open_optional<T>(
    row: &CohortRow,
    kind: VolumeKind,
    path: &Path,
    open: impl FnOnce(&Path) -> LoadResult<T>,
) -> Result<Option<T>, RowError> {
    if !path.is_file() {
        info!("{row}: no {kind} at {}", path.display());
        return Ok(None);
    }
    debug!("{row}: loading {kind} from {}", path.display());
    open(path).map(Some).map_err(|source| RowError::Load {
        kind,
        path: path.to_owned(),
        source,
    })
}

/// 计算单行 (被试, 会话) 的指标.
///
/// 解剖扫描缺失或无法读取时返回 `Err`. 可选输入无法使用时仍返回 `Ok`,
/// 原因记录在 [`ProcessedRow::degraded`] 中.
pub fn process_row(row: &CohortRow, base_dir: &Path, config: &BatchConfig) -> RowResult {
    let layout = &config.layout;

    let path = layout.resolve(base_dir, VolumeKind::Anatomical, row);
    let scan = open_optional(row, VolumeKind::Anatomical, &path, |p| {
        MriScan::open(p, config.precision)
    })?
    .ok_or_else(|| RowError::Missing {
        kind: VolumeKind::Anatomical,
        path: path.clone(),
    })?;
    debug!(
        "{row}: {:?} voxels of {:.3} mm³",
        scan.shape(),
        scan.voxel()
    );

    let efc = entropy_focus_criterion(scan.data(), None)?;
    if !efc.is_finite() {
        warn!("Found NaN or Inf EFC for {row}");
    }

    let mut degraded = Vec::new();

    let path = layout.resolve(base_dir, VolumeKind::Skullstrip, row);
    // 颅骨剥离扫描不做精度转换.
    let brain = open_optional(row, VolumeKind::Skullstrip, &path, |p| {
        MriScan::open(p, Precision::Float64)
    });
    let t_snr = match brain {
        Ok(brain) => brain.map(|b| anatomical_snr(b.data())),
        Err(e) => {
            warn!("{row}: T_SNR left empty, {e}");
            degraded.push(e);
            None
        }
    };

    let path = layout.resolve(base_dir, VolumeKind::Segmentation, row);
    let segmentation = open_optional(row, VolumeKind::Segmentation, &path, |p| MriLabel::open(p))
        .and_then(|label| match label {
            Some(label) if label.shape() != scan.shape() => Err(RowError::ShapeMismatch {
                expected: scan.shape(),
                found: label.shape(),
            }),
            other => Ok(other),
        });
    let (cnr, cjv) = match segmentation {
        Ok(Some(label)) => {
            warn_empty_tissues(row, &label, &config.tissues);
            let normalized = scan.min_max_normalized();
            let cnr = contrast_to_noise_ratio(normalized.view(), label.data(), &config.tissues)?;
            let cjv =
                coefficient_of_joint_variation(normalized.view(), label.data(), &config.tissues)?;
            (Some(cnr), Some(cjv))
        }
        Ok(None) => (None, None),
        Err(e) => {
            warn!("{row}: CNR and CJV left empty, {e}");
            degraded.push(e);
            (None, None)
        }
    };

    Ok(ProcessedRow {
        metrics: MetricsRow {
            participant_id: row.participant_id.clone(),
            session_id: row.session_id.clone(),
            efc,
            t_snr,
            cnr,
            cjv,
        },
        degraded,
    })
}

/// 分割中没有某个组织类别的体素时, 依赖它的指标为 NaN.
fn warn_empty_tissues(row: &CohortRow, label: &MriLabel, tissues: &TissueLabels) {
    for class in TissueClass::ALL {
        let count = label.count_in(tissues.codes(class));
        if count == 0 {
            warn!("{row}: no {class:?} voxels in segmentation");
        } else {
            debug!("{row}: {count} {class:?} voxel(s)");
        }
    }
}

/// 按 cohort 顺序依次计算每行的指标.
///
/// 该函数不写文件; 调用者在批次结束后通过 [`BatchReport::write_csv`] 一次性写出.
pub fn calculate_metrics<P: AsRef<Path>>(
    cohort: &[CohortRow],
    base_dir: P,
    config: &BatchConfig,
) -> BatchReport {
    let base_dir = base_dir.as_ref();
    let total = cohort.len();
    info!(
        "Calculating metrics for {total} session(s) under {}",
        base_dir.display()
    );

    BatchReport::collect(
        cohort.iter().enumerate().map(|(i, row)| {
            info!("[{}/{total}] {row}", i + 1);
            (row, process_row(row, base_dir, config))
        }),
        config.decimals,
    )
}

/// 借助 `rayon`, 并行地计算每行的指标. 结果顺序与 cohort 顺序一致.
#[cfg(feature = "rayon")]
pub fn par_calculate_metrics<P: AsRef<Path>>(
    cohort: &[CohortRow],
    base_dir: P,
    config: &BatchConfig,
) -> BatchReport {
    let base_dir = base_dir.as_ref();
    info!(
        "Calculating metrics for {} session(s) under {} in parallel",
        cohort.len(),
        base_dir.display()
    );

    let outcomes: Vec<RowResult> = cohort
        .par_iter()
        .map(|row| process_row(row, base_dir, config))
        .collect();
    BatchReport::collect(cohort.iter().zip(outcomes), config.decimals)
}
