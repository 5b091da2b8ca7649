//! 组织类别与分割标签编码之间的映射.

use super::error::MetricError;
use crate::consts::tissue::{BACKGROUND, GRAY_MATTER, WHITE_MATTER};
use std::str::FromStr;

/// 参与 CNR/CJV 计算的组织类别.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TissueClass {
    /// 白质.
    WhiteMatter,

    /// 灰质.
    GrayMatter,

    /// 背景.
    Background,
}

impl TissueClass {
    /// 所有组织类别.
    pub const ALL: [TissueClass; 3] = [Self::WhiteMatter, Self::GrayMatter, Self::Background];
}

impl FromStr for TissueClass {
    type Err = MetricError;

    /// 接受 `wm`/`white_matter`, `gm`/`gray_matter`/`grey_matter`,
    /// `bg`/`background`, 不区分大小写.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wm" | "white_matter" => Ok(Self::WhiteMatter),
            "gm" | "gray_matter" | "grey_matter" => Ok(Self::GrayMatter),
            "bg" | "background" => Ok(Self::Background),
            _ => Err(MetricError::UnknownTissueClass(s.to_string())),
        }
    }
}

/// 各组织类别对应的标签值集合.
///
/// 三个集合两两不相交, 这一点在构造时检查. 成员判定是 "标签值属于集合",
/// 而不是范围判定.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TissueLabels {
    white_matter: Vec<i32>,
    gray_matter: Vec<i32>,
    background: Vec<i32>,
}

impl Default for TissueLabels {
    /// FreeSurfer `aseg` 约定: 白质 `{2, 41}`, 灰质 `{3, 42}`, 背景 `{0}`.
    fn default() -> Self {
        Self {
            white_matter: WHITE_MATTER.to_vec(),
            gray_matter: GRAY_MATTER.to_vec(),
            background: BACKGROUND.to_vec(),
        }
    }
}

#[inline]
fn sorted_set<I: IntoIterator<Item = i32>>(it: I) -> Vec<i32> {
    let mut v: Vec<i32> = it.into_iter().collect();
    v.sort_unstable();
    v.dedup();
    v
}

impl TissueLabels {
    /// 由三个标签集合构建. 若某个标签值出现在多个集合中, 返回 `Err`.
    pub fn new<W, G, B>(white_matter: W, gray_matter: G, background: B) -> Result<Self, MetricError>
    where
        W: IntoIterator<Item = i32>,
        G: IntoIterator<Item = i32>,
        B: IntoIterator<Item = i32>,
    {
        let ans = Self {
            white_matter: sorted_set(white_matter),
            gray_matter: sorted_set(gray_matter),
            background: sorted_set(background),
        };
        ans.check_disjoint()?;
        Ok(ans)
    }

    /// 由 "组织类别名称 -> 标签值集合" 映射构建.
    ///
    /// 名称规则见 [`TissueClass::from_str`]. 映射中未出现的类别对应空集合,
    /// 此时依赖该类别的指标结果为 NaN.
    pub fn from_mapping<K, V, I>(mapping: I) -> Result<Self, MetricError>
    where
        K: AsRef<str>,
        V: IntoIterator<Item = i32>,
        I: IntoIterator<Item = (K, V)>,
    {
        let (mut wm, mut gm, mut bg) = (Vec::new(), Vec::new(), Vec::new());
        for (name, codes) in mapping {
            match name.as_ref().parse::<TissueClass>()? {
                TissueClass::WhiteMatter => wm.extend(codes),
                TissueClass::GrayMatter => gm.extend(codes),
                TissueClass::Background => bg.extend(codes),
            }
        }
        Self::new(wm, gm, bg)
    }

    /// 获取 `class` 的标签值集合 (升序).
    #[inline]
    pub fn codes(&self, class: TissueClass) -> &[i32] {
        match class {
            TissueClass::WhiteMatter => &self.white_matter,
            TissueClass::GrayMatter => &self.gray_matter,
            TissueClass::Background => &self.background,
        }
    }

    /// 交换白质和灰质集合, 背景保持不变.
    pub fn swapped(&self) -> Self {
        Self {
            white_matter: self.gray_matter.clone(),
            gray_matter: self.white_matter.clone(),
            background: self.background.clone(),
        }
    }

    fn check_disjoint(&self) -> Result<(), MetricError> {
        let sets = [&self.white_matter, &self.gray_matter, &self.background];
        for (i, a) in sets.iter().enumerate() {
            for b in sets.iter().skip(i + 1) {
                if let Some(code) = a.iter().find(|c| b.binary_search(c).is_ok()) {
                    return Err(MetricError::OverlappingTissueLabels(*code));
                }
            }
        }
        Ok(())
    }
}
