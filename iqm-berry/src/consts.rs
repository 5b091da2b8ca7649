//! 通用常量.

/// 默认的组织标签编码.
///
/// 这些编码遵循 FreeSurfer `aseg` 图谱约定 (左/右半球各一个编码).
/// 它们只是 [`TissueLabels`](crate::metrics::TissueLabels) 的默认值,
/// 使用其它分割图谱时应注入自己的配置.
pub mod tissue {
    /// 白质标签值.
    pub const WHITE_MATTER: [i32; 2] = [2, 41];

    /// 灰质标签值.
    pub const GRAY_MATTER: [i32; 2] = [3, 42];

    /// 背景标签值.
    pub const BACKGROUND: [i32; 1] = [0];
}

/// 输出表格的列名.
pub mod columns {
    /// 被试编号列.
    pub const PARTICIPANT_ID: &str = "participant_id";

    /// 被试编号列 (旧版 cohort 表格中的别名).
    pub const SUB_ID: &str = "SubID";

    /// 扫描会话列.
    pub const SESSION_ID: &str = "session_id";

    /// 扫描会话列 (旧版 cohort 表格中的别名).
    pub const SESSION_ID_ALIAS: &str = "SessionID";

    /// Entropy Focus Criterion.
    pub const EFC: &str = "EFC";

    /// 颅骨剥离后的解剖 SNR.
    pub const T_SNR: &str = "T_SNR";

    /// Contrast-to-Noise Ratio.
    pub const CNR: &str = "CNR";

    /// Coefficient of Joint Variation.
    pub const CJV: &str = "CJV";
}

/// EFC 计算时加在对数内部的微小量, 避免 `ln(0)`.
pub const EFC_EPSILON: f64 = 1e-16;

/// 报告路径上默认保留的小数位数.
pub const DEFAULT_DECIMALS: u32 = 4;

/// cohort 表格相对数据集根目录的默认位置.
pub const DEFAULT_COHORT_TABLE: &str = "derivatives/scanning_parameters.tsv";

/// 输出表格默认文件名.
pub const METRICS_FILE_NAME: &str = "metrics.csv";
