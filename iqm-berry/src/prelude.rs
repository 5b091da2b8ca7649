//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::data::{MriLabel, MriScan, NiftiHeaderAttr, Precision};

pub use crate::metrics::{
    anatomical_snr, coefficient_of_joint_variation, contrast_to_noise_ratio,
    entropy_focus_criterion, min_max_normalize, TissueClass, TissueLabels,
};

pub use crate::dataset::{read_cohort, BidsLayout, CohortRow, PathTemplate, VolumeKind};

#[cfg(feature = "rayon")]
pub use crate::batch::par_calculate_metrics;
pub use crate::batch::{calculate_metrics, BatchConfig, BatchReport, ProcessedRow, RowFailure};

pub use crate::table::{read_metrics_csv, write_metrics_csv, MetricsRow};

pub use crate::consts::{DEFAULT_COHORT_TABLE, METRICS_FILE_NAME};
