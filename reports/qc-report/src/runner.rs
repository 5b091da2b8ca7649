//! 程序运行函数.

use crate::result::QcResult;
use anyhow::{ensure, Context};
use iqm_berry::batch::{self, BatchConfig};
use iqm_berry::dataset::read_cohort;
use iqm_berry::table::read_metrics_csv;
use log::info;
use std::fs;
use std::path::Path;
use utils::loader;

/// 实际运行.
pub fn run(data_dir: &Path, output_dir: &Path) -> anyhow::Result<QcResult> {
    ensure!(
        data_dir.is_dir(),
        "Data directory {} not found.",
        data_dir.display()
    );
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Creating output directory {}", output_dir.display()))?;

    let cohort_path = loader::cohort_path(data_dir);
    let cohort = read_cohort(&cohort_path)
        .with_context(|| format!("Loading cohort table {}", cohort_path.display()))?;

    let config = BatchConfig::default();
    let workers = utils::cpus();
    let report = if workers > 1 {
        info!("Running on {workers} workers...");
        batch::par_calculate_metrics(&cohort, data_dir, &config)
    } else {
        batch::calculate_metrics(&cohort, data_dir, &config)
    };

    let metrics_path = loader::metrics_path(output_dir);
    report
        .write_csv(&metrics_path)
        .with_context(|| format!("Writing {}", metrics_path.display()))?;
    info!(
        "Wrote {} row(s) to {}",
        report.rows.len(),
        metrics_path.display()
    );

    // 统计信息基于写出的 (已舍入的) 表格.
    let rows = read_metrics_csv(&metrics_path)
        .with_context(|| format!("Reading back {}", metrics_path.display()))?;
    Ok(QcResult::new(rows, report.failures, report.degraded))
}
