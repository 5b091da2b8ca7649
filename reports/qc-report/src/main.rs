//! 计算数据集中所有 (被试, 会话) 的图像质量指标, 写出 `metrics.csv` 并打印统计信息.
//!
//! 用法: `qc-report [DATA_DIR] [OUTPUT_DIR]`.
//! 省略时分别回落到 `$IQM_DATA_DIR` (或 `$HOME/dataset/ultracortex`) 和
//! `$IQM_OUTPUT_DIR` (或 `{DATA_DIR}/derivatives/iqm`).

use anyhow::Context;
use log::LevelFilter;
use std::path::PathBuf;
use utils::loader;

mod result;
mod runner;

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let mut args = std::env::args_os().skip(1);
    let data_dir = args
        .next()
        .map(PathBuf::from)
        .or_else(loader::data_dir_from_env_or_home)
        .context("Cannot determine the dataset directory")?;
    let output_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| loader::output_dir_from_env_or(&data_dir));

    let result = runner::run(&data_dir, &output_dir)?;
    result.analyze();
    Ok(())
}
