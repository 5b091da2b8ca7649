//! 单行 (被试, 会话) 处理错误.

use crate::data::LoadError;
use crate::dataset::{CohortRow, VolumeKind};
use crate::metrics::MetricError;
use crate::Idx3d;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 处理某一行时遇到的错误.
///
/// 解剖扫描的错误是致命的, 该行不会出现在输出表格中. 可选输入 (颅骨剥离扫描,
/// 人工分割) 文件不存在不是错误; 文件存在却无法使用时该行被降级, 对应指标为空.
#[derive(Debug, Error)]
pub enum RowError {
    /// 必需的解剖扫描不存在.
    #[error("{kind} not found at {}", .path.display())]
    Missing {
        /// 缺失的体数据种类.
        kind: VolumeKind,

        /// 期望的路径.
        path: PathBuf,
    },

    /// 文件存在, 但读取或解码失败.
    #[error("failed to load {kind} from {}: {source}", .path.display())]
    Load {
        /// 体数据种类.
        kind: VolumeKind,

        /// 文件路径.
        path: PathBuf,

        /// 底层错误.
        #[source]
        source: LoadError,
    },

    /// 人工分割与解剖扫描形状不一致.
    #[error("segmentation shape {found:?} does not match anatomical volume shape {expected:?}")]
    ShapeMismatch {
        /// 解剖扫描形状 `(z, H, W)`.
        expected: Idx3d,

        /// 分割形状 `(z, H, W)`.
        found: Idx3d,
    },

    /// 指标计算的结构性错误.
    #[error(transparent)]
    Metric(#[from] MetricError),
}

/// 某一行的失败或降级记录.
#[derive(Debug)]
pub struct RowFailure {
    /// 对应的行.
    pub row: CohortRow,

    /// 原因.
    pub error: RowError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.row, self.error)
    }
}
