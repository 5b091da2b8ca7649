//! 对 `iqm-berry::dataset` 的更一层封装. 提供报告程序使用的默认路径.

use iqm_berry::consts::{DEFAULT_COHORT_TABLE, METRICS_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// 获取数据集根目录.
///
/// 1. 若环境变量 `$IQM_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/ultracortex`. 无法确定主目录时返回 `None`.
pub fn data_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("IQM_DATA_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => iqm_berry::dataset::home_dataset_dir_with(["ultracortex"]),
    }
}

/// 获取输出目录.
///
/// 1. 若环境变量 `$IQM_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `{data_dir}/derivatives/iqm`.
pub fn output_dir_from_env_or(data_dir: &Path) -> PathBuf {
    match env::var("IQM_OUTPUT_DIR") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => data_dir.join("derivatives").join("iqm"),
    }
}

/// 数据集中 cohort 表格的位置.
#[inline]
pub fn cohort_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DEFAULT_COHORT_TABLE)
}

/// 输出目录中指标表格的位置.
#[inline]
pub fn metrics_path(output_dir: &Path) -> PathBuf {
    output_dir.join(METRICS_FILE_NAME)
}
