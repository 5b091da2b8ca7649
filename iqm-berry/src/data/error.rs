//! 体数据加载错误.

use thiserror::Error;

/// 打开 nii 体数据文件时的错误.
#[derive(Debug, Error)]
pub enum LoadError {
    /// 底层 nifti 读取或解码错误 (文件不存在, header 损坏等).
    #[error("failed to read nifti file: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数据不是三维体数据. 参数为实际维度.
    ///
    /// 形如 `[W, H, z, 1]` 的四维数据会被当作三维数据接受.
    #[error("expected a 3-D volume, found {0} dimension(s)")]
    NotVolumetric(usize),
}
