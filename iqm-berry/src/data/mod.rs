use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::metrics;
use crate::Idx3d;

mod error;

pub use error::LoadError;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 打开 nii 体数据加载结果.
pub type LoadResult<T> = Result<T, LoadError>;

/// 体素数值精度.
///
/// 同一批次内所有主扫描必须使用相同的精度, 否则不同被试之间的指标会引入系统偏差.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Precision {
    /// 向零截断为 32 位整数 (超出范围时饱和, NaN 变为 0), 再以 `f64` 保存.
    #[default]
    Int32,

    /// 保持 `f64` 原值.
    Float64,
}

impl Precision {
    /// 将单个体素值转换到该精度.
    #[inline]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Precision::Int32 => v as i32 as f64,
            Precision::Float64 => v,
        }
    }
}

/// 读取 nii 文件, 返回 header 和 `(z, H, W)` 顺序的三维数据.
///
/// 末尾单例维度 (`[W, H, z, 1]`) 会被移除.
fn read_volume(path: &Path) -> LoadResult<(BoxedHeader, Array3<f64>)> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = Box::new(obj.header().clone());

    let mut data: ArrayD<f64> = obj.into_volume().into_ndarray::<f64>()?;
    while data.ndim() > 3 && data.shape()[data.ndim() - 1] == 1 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    let ndim = data.ndim();
    if ndim != 3 {
        return Err(LoadError::NotVolumetric(ndim));
    }

    // [W, H, z] -> [z, H, W].
    // hint: 原第一维向下增长, 原第二维向右增长.
    let data = data
        .permuted_axes([2, 1, 0].as_slice())
        .into_dimensionality::<Ix3>()
        .map_err(|_| LoadError::NotVolumetric(ndim))?;
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    };

    Ok((header, data))
}

/// 为手工构建的数据生成最小 header: 维度来自数据, 体素分辨率为 1mm 各向同性.
fn synthetic_header((z, h, w): Idx3d) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
    header.pixdim = [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    header.intent_name[..4].copy_from_slice(b"fake");
    header
}

/// nii 文件 header 的共用属性.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表空间 (相邻切片方向),
    /// 高, 宽.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 判断该结构是否是由 `from_array` 手动拼接的.
    #[inline]
    fn is_faked(&self) -> bool {
        self.header().intent_name.starts_with(b"fake")
    }
}

/// nii 格式 3D MRI 扫描, 包括 header 和体素强度. 强度以 `f64` 保存.
#[derive(Debug, Clone)]
pub struct MriScan {
    header: BoxedHeader,
    data: Array3<f64>,
}

impl NiftiHeaderAttr for MriScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriScan {
    /// 打开 nii 文件格式的 3D MRI 扫描, 并将体素值转换到 `precision`.
    /// `path` 为 nii (或 nii.gz) 文件的本地路径.
    pub fn open<P: AsRef<Path>>(path: P, precision: Precision) -> LoadResult<Self> {
        let (header, mut data) = read_volume(path.as_ref())?;
        if precision != Precision::Float64 {
            data.mapv_inplace(|v| precision.apply(v));
        }
        Ok(Self { header, data })
    }

    /// 直接由 `(z, H, W)` 顺序的强度数据创建扫描. 仅用于实验或测试.
    pub fn from_array(data: Array3<f64>) -> Self {
        let header = synthetic_header(data.dim());
        Self { header, data }
    }

    /// 数据形状 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// 使用该扫描自身的最小/最大值, 将强度线性缩放到 `[0, 1]`.
    #[inline]
    pub fn min_max_normalized(&self) -> Array3<f64> {
        metrics::min_max_normalize(self.data.view())
    }
}

/// nii 格式 3D 组织分割标注, 包括 header 和标签. 标签值以 `i32` 保存.
#[derive(Debug, Clone)]
pub struct MriLabel {
    header: BoxedHeader,
    data: Array3<i32>,
}

impl NiftiHeaderAttr for MriLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl MriLabel {
    /// 打开 nii 文件格式的 3D 分割标注. 浮点存储的标签向零截断为整数.
    pub fn open<P: AsRef<Path>>(path: P) -> LoadResult<Self> {
        let (header, data) = read_volume(path.as_ref())?;
        let data = data.mapv(|v| v as i32);
        Ok(Self { header, data })
    }

    /// 直接由 `(z, H, W)` 顺序的标签数据创建标注. 仅用于实验或测试.
    pub fn from_array(data: Array3<i32>) -> Self {
        let header = synthetic_header(data.dim());
        Self { header, data }
    }

    /// 数据形状 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i32> {
        self.data.view()
    }

    /// 获取标签值属于 `codes` 的体素个数.
    #[inline]
    pub fn count_in(&self, codes: &[i32]) -> usize {
        self.data.iter().filter(|p| codes.contains(p)).count()
    }
}
