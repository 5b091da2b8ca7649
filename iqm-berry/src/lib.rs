#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为按 BIDS 风格组织的 MRI 脑部数据集计算图像质量指标 (IQMs),
//! 并将整个 cohort 的结果汇总为一张表格.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 指标定义改编自 MRIQC 的 T1w IQMs, 面向超高场 (9.4T) 数据.
//! 2. 数值退化 (NaN, ±Inf) 是有意义的输出, 不会被替换或丢弃.
//! 3. 结构性问题 (文件缺失, 形状不一致) 以 `Result::Err` 返回, 不会 panic.
//!
//! # 开发计划
//!
//! ### 四个指标的纯函数实现 ✅
//!
//! EFC, 解剖 SNR, CNR, CJV. 全部以 `f64` 计算, 支持任意维度的 `ndarray` 视图.
//!
//! 实现位于 `iqm-berry/src/metrics`.
//!
//! ### 可注入的组织标签编码 ✅
//!
//! 默认遵循 FreeSurfer `aseg` 约定 (白质 `{2, 41}`, 灰质 `{3, 42}`, 背景 `{0}`),
//! 也可以从 "类别名称 -> 编码集合" 映射构建.
//!
//! 实现位于 `iqm-berry/src/metrics/tissue.rs`.
//!
//! ### nii 体数据加载 ✅
//!
//! 解剖扫描以 `f64` 保存, 并按批次统一的精度转换; 分割标签以 `i32` 保存.
//!
//! 实现位于 `iqm-berry/src/data`.
//!
//! ### cohort 表格与路径约定 ✅
//!
//! 实现位于 `iqm-berry/src/dataset`.
//!
//! ### 批量计算, 逐行容错 ✅
//!
//! 缺少可选输入时对应指标为空; 缺少解剖扫描时跳过该行并记录原因.
//! 开启 `rayon` feature 时可并行计算, 输出顺序不变.
//!
//! 实现位于 `iqm-berry/src/batch`.
//!
//! ### 输出表格 ✅
//!
//! 实现位于 `iqm-berry/src/table.rs`.
//!
//! ### 可视化 ⌛️
//!
//! 暂不考虑.

/// 三维索引, 按 `(z, H, W)` 顺序.
pub type Idx3d = (usize, usize, usize);

/// nii 体数据基础数据结构.
pub mod data;

pub use data::{LoadError, MriLabel, MriScan, NiftiHeaderAttr, Precision};

pub mod batch;
pub mod consts;
pub mod dataset;
pub mod metrics;
pub mod prelude;
pub mod table;
