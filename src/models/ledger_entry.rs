use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{DocumentPolicy, JobPosting};

/// 申请记录表头
pub const LEDGER_HEADER: [&str; 7] = [
    "Job ID",
    "Company",
    "Position",
    "Resume",
    "Transcript",
    "Cover Letter",
    "Date",
];

/// 申请记录中的一行
///
/// 只在提交成功后写入；`job_id` 在整个记录文件中唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Company")]
    pub company: Option<String>,
    #[serde(rename = "Position")]
    pub title: Option<String>,
    #[serde(rename = "Resume", with = "yes_no")]
    pub resume: bool,
    #[serde(rename = "Transcript", with = "yes_no")]
    pub transcript: bool,
    #[serde(rename = "Cover Letter", with = "yes_no")]
    pub cover_letter: bool,
    /// 提交日期，格式 `MM/DD`
    #[serde(rename = "Date")]
    pub date: String,
}

impl LedgerEntry {
    /// 根据职位和附件策略构建记录
    pub fn new(posting: &JobPosting, policy: &DocumentPolicy, submitted_on: NaiveDate) -> Self {
        Self {
            job_id: posting.job_id.clone(),
            company: posting.company.clone(),
            title: posting.title.clone(),
            resume: policy.include_resume,
            transcript: policy.include_transcript,
            cover_letter: policy.include_cover_letter,
            date: submitted_on.format("%m/%d").to_string(),
        }
    }
}

mod yes_no {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.trim().eq_ignore_ascii_case("yes"))
    }
}
