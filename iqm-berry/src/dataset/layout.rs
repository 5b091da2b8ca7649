//! BIDS 风格的文件路径约定.
//!
//! 每种体数据的路径由一个相对数据集根目录的模板给出. 模板中可以使用
//! `{subject}` 和 `{session}` 两个占位符, 大小写敏感.

use super::cohort::CohortRow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// 路径模板错误.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// 模板中出现了未知占位符.
    #[error("unknown placeholder `{{{0}}}` in path template")]
    UnknownPlaceholder(String),

    /// 花括号不配对.
    #[error("unbalanced braces in path template `{0}`")]
    UnbalancedBraces(String),
}

/// 每个 (被试, 会话) 可能用到的体数据种类.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VolumeKind {
    /// T1w 解剖扫描 (必需).
    Anatomical,

    /// 颅骨剥离后的扫描 (可选).
    Skullstrip,

    /// 人工组织分割 (可选).
    Segmentation,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeKind::Anatomical => "anatomical volume",
            VolumeKind::Skullstrip => "skull-stripped volume",
            VolumeKind::Segmentation => "manual segmentation",
        };
        f.write_str(s)
    }
}

/// 相对数据集根目录的路径模板.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// 被试占位符.
    pub const SUBJECT: &'static str = "{subject}";

    /// 会话占位符.
    pub const SESSION: &'static str = "{session}";

    /// 检查并创建模板.
    pub fn new(template: impl Into<String>) -> Result<Self, LayoutError> {
        let template = template.into();
        let mut rest = template.as_str();
        while let Some(i) = rest.find(['{', '}']) {
            if rest.as_bytes()[i] == b'}' {
                return Err(LayoutError::UnbalancedBraces(template.clone()));
            }
            let tail = &rest[i + 1..];
            let Some(j) = tail.find(['{', '}']) else {
                return Err(LayoutError::UnbalancedBraces(template.clone()));
            };
            if tail.as_bytes()[j] == b'{' {
                return Err(LayoutError::UnbalancedBraces(template.clone()));
            }
            let name = &tail[..j];
            if name != "subject" && name != "session" {
                return Err(LayoutError::UnknownPlaceholder(name.to_string()));
            }
            rest = &tail[j + 1..];
        }
        Ok(Self(template))
    }

    /// 用 `subject` 和 `session` 替换占位符.
    pub fn render(&self, subject: &str, session: &str) -> String {
        self.0
            .replace(Self::SUBJECT, subject)
            .replace(Self::SESSION, session)
    }

    /// 模板原文.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 内置模板, 调用者保证其合法.
    #[inline]
    fn trusted(template: &str) -> Self {
        debug_assert!(Self::new(template).is_ok());
        Self(template.to_string())
    }
}

impl FromStr for PathTemplate {
    type Err = LayoutError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 数据集目录布局: 三种体数据各自的路径模板.
///
/// 默认布局中 cohort 表格的被试编号已经带有 `sub-` 前缀:
///
/// - 解剖扫描: `{subject}/ses-{session}/anat/{subject}_ses-{session}_T1w.nii`
/// - 颅骨剥离: `derivatives/skullstrips/{subject}_ses-{session}_skullstrip.nii`
/// - 人工分割: `derivatives/manual_segmentation/{subject}_ses-{session}_seg.nii`
///
/// 被试编号不带前缀时使用 [`BidsLayout::sub_prefixed`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BidsLayout {
    anatomical: PathTemplate,
    skullstrip: PathTemplate,
    segmentation: PathTemplate,
}

impl Default for BidsLayout {
    fn default() -> Self {
        Self {
            anatomical: PathTemplate::trusted(
                "{subject}/ses-{session}/anat/{subject}_ses-{session}_T1w.nii",
            ),
            skullstrip: PathTemplate::trusted(
                "derivatives/skullstrips/{subject}_ses-{session}_skullstrip.nii",
            ),
            segmentation: PathTemplate::trusted(
                "derivatives/manual_segmentation/{subject}_ses-{session}_seg.nii",
            ),
        }
    }
}

impl BidsLayout {
    /// cohort 表格中的被试编号不带 `sub-` 前缀时使用的布局.
    pub fn sub_prefixed() -> Self {
        Self {
            anatomical: PathTemplate::trusted(
                "sub-{subject}/ses-{session}/anat/sub-{subject}_ses-{session}_T1w.nii",
            ),
            skullstrip: PathTemplate::trusted(
                "derivatives/skullstrips/sub-{subject}_ses-{session}_skullstrip.nii",
            ),
            segmentation: PathTemplate::trusted(
                "derivatives/manual_segmentation/sub-{subject}_ses-{session}_seg.nii",
            ),
        }
    }

    /// 替换 `kind` 对应的模板.
    pub fn with_template(mut self, kind: VolumeKind, template: PathTemplate) -> Self {
        match kind {
            VolumeKind::Anatomical => self.anatomical = template,
            VolumeKind::Skullstrip => self.skullstrip = template,
            VolumeKind::Segmentation => self.segmentation = template,
        }
        self
    }

    /// 获取 `kind` 对应的模板.
    #[inline]
    pub fn template(&self, kind: VolumeKind) -> &PathTemplate {
        match kind {
            VolumeKind::Anatomical => &self.anatomical,
            VolumeKind::Skullstrip => &self.skullstrip,
            VolumeKind::Segmentation => &self.segmentation,
        }
    }

    /// 解析 `row` 的 `kind` 体数据在 `base_dir` 下的完整路径. 不检查文件是否存在.
    pub fn resolve(&self, base_dir: &Path, kind: VolumeKind, row: &CohortRow) -> PathBuf {
        let rel = self
            .template(kind)
            .render(&row.participant_id, &row.session_id);
        let mut ans = base_dir.to_owned();
        ans.extend(rel.split('/').filter(|s| !s.is_empty()));
        ans
    }
}
