//! 指标计算错误.

use thiserror::Error;

/// 指标计算或组织标签配置的错误.
///
/// 数值退化 (NaN, ±Inf) 不是错误, 它们会作为指标值原样返回.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricError {
    /// 配对数组 (体数据与标签, 体数据与 frame mask) 的形状不一致.
    #[error("shape mismatch: volume is {expected:?}, paired array is {found:?}")]
    ShapeMismatch {
        /// 体数据形状.
        expected: Vec<usize>,

        /// 配对数组形状.
        found: Vec<usize>,
    },

    /// 同一个标签值出现在多个组织类别中.
    #[error("label code {0} is assigned to more than one tissue class")]
    OverlappingTissueLabels(i32),

    /// 无法识别的组织类别名称.
    #[error("unknown tissue class `{0}`")]
    UnknownTissueClass(String),
}
