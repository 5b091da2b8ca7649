//! 集成测试共用的数据集构建工具.

#![allow(dead_code)]

use iqm_berry::dataset::{BidsLayout, CohortRow, VolumeKind};
use ndarray::Array3;
use nifti::writer::WriterOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 白质, 灰质, 背景标签.
pub const WM: u8 = 2;
pub const GM: u8 = 3;
pub const BG: u8 = 0;

/// 只初始化一次日志.
pub fn init_logger() {
    let _ = simple_logger::SimpleLogger::new().init();
}

/// 在临时目录中按 BIDS 布局写出 nii 文件.
pub struct Dataset {
    dir: TempDir,
    layout: BidsLayout,
}

impl Dataset {
    pub fn new() -> Self {
        Self::with_layout(BidsLayout::default())
    }

    pub fn with_layout(layout: BidsLayout) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            layout,
        }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_of(&self, kind: VolumeKind, row: &CohortRow) -> PathBuf {
        self.layout.resolve(self.base(), kind, row)
    }

    /// 写出强度体数据.
    pub fn put_volume(&self, kind: VolumeKind, row: &CohortRow, data: &Array3<f32>) -> PathBuf {
        let path = self.path_of(kind, row);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        WriterOptions::new(&path).write_nifti(data).unwrap();
        path
    }

    /// 写出分割标签.
    pub fn put_labels(&self, row: &CohortRow, data: &Array3<u8>) -> PathBuf {
        let path = self.path_of(VolumeKind::Segmentation, row);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        WriterOptions::new(&path).write_nifti(data).unwrap();
        path
    }

    /// 在 `kind` 的位置写出无法解析的内容.
    pub fn put_garbage(&self, kind: VolumeKind, row: &CohortRow) -> PathBuf {
        let path = self.path_of(kind, row);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not a nifti file").unwrap();
        path
    }

    /// 写出一个完整的被试: 解剖扫描, 颅骨剥离扫描, 以及可选的分割.
    pub fn put_subject(&self, row: &CohortRow, with_segmentation: bool) {
        let (scan, labels) = phantom(8);
        self.put_volume(VolumeKind::Anatomical, row, &scan);
        self.put_volume(VolumeKind::Skullstrip, row, &brain_only(&scan, &labels));
        if with_segmentation {
            self.put_labels(row, &labels);
        }
    }
}

/// 边长为 `n` 的体模: 最外两层为背景, 内部一半白质一半灰质.
/// 强度均为整数, 白质约 100, 灰质约 60, 背景约 2.
pub fn phantom(n: usize) -> (Array3<f32>, Array3<u8>) {
    let labels = Array3::from_shape_fn((n, n, n), |(a, b, c)| {
        let inner = |i: usize| (2..n - 2).contains(&i);
        if !(inner(a) && inner(b) && inner(c)) {
            BG
        } else if c < n / 2 {
            WM
        } else {
            GM
        }
    });
    let scan = Array3::from_shape_fn((n, n, n), |(a, b, c)| {
        let jitter = ((a * 7 + b * 3 + c * 5) % 5) as f32;
        match labels[(a, b, c)] {
            WM => 100.0 + jitter,
            GM => 60.0 + 2.0 * jitter,
            _ => jitter / 2.0,
        }
    });
    (scan, labels)
}

/// 把背景体素置零, 模拟颅骨剥离后的扫描.
pub fn brain_only(scan: &Array3<f32>, labels: &Array3<u8>) -> Array3<f32> {
    let mut out = scan.clone();
    out.zip_mut_with(labels, |v, l| {
        if *l == BG {
            *v = 0.0;
        }
    });
    out
}
