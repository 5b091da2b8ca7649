//! Cohort 表格读取.
//!
//! cohort 表格是制表符分隔的文本文件, 每行对应一个 (被试, 会话).
//! 只有被试列和会话列会被读取, 其余列被忽略.

use crate::consts::columns::{PARTICIPANT_ID, SESSION_ID, SESSION_ID_ALIAS, SUB_ID};
use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;

/// 读取 cohort 表格的错误.
#[derive(Debug, Error)]
pub enum CohortError {
    /// 底层 I/O 或表格格式错误.
    #[error("failed to read cohort table: {0}")]
    Csv(#[from] csv::Error),

    /// 表头缺少必要的列. 参数为该列接受的名称.
    #[error("cohort table has no `{0}` column")]
    MissingColumn(&'static str),
}

/// cohort 表格中的一行: 一个被试的一次扫描会话.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CohortRow {
    /// 被试编号, 例如 `sub-01`.
    pub participant_id: String,

    /// 会话编号, 不带 `ses-` 前缀.
    pub session_id: String,
}

impl CohortRow {
    /// 创建一行.
    pub fn new(participant_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for CohortRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ses-{}", self.participant_id, self.session_id)
    }
}

/// 在表头中查找 `names` 中第一个出现的列名.
fn find_column(headers: &csv::StringRecord, names: [&'static str; 2]) -> Result<usize, CohortError> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
        .ok_or(CohortError::MissingColumn(names[0]))
}

/// 从任意数据源读取 cohort 表格. 行的顺序保持不变.
///
/// 被试列名为 `participant_id` 或 `SubID`, 会话列名为 `session_id` 或 `SessionID`.
pub fn read_cohort_from<R: io::Read>(reader: R) -> Result<Vec<CohortRow>, CohortError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let sub = find_column(&headers, [PARTICIPANT_ID, SUB_ID])?;
    let ses = find_column(&headers, [SESSION_ID, SESSION_ID_ALIAS])?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        rows.push(CohortRow::new(field(sub), field(ses)));
    }
    Ok(rows)
}

/// 从 `path` 读取 cohort 表格.
pub fn read_cohort<P: AsRef<Path>>(path: P) -> Result<Vec<CohortRow>, CohortError> {
    let file = std::fs::File::open(path.as_ref()).map_err(csv::Error::from)?;
    read_cohort_from(io::BufReader::new(file))
}
