use std::sync::OnceLock;

use regex::Regex;

/// 职位详情
///
/// 每次打开职位页面时重新构建，构建后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPosting {
    /// 去重主键，取自 URL 路径
    pub job_id: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub url: String,
}

impl JobPosting {
    /// 用于日志的简短描述
    pub fn describe(&self) -> String {
        format!(
            "{} @ {} (ID: {})",
            self.title.as_deref().unwrap_or("<未知职位>"),
            self.company.as_deref().unwrap_or("<未知公司>"),
            self.job_id
        )
    }
}

fn job_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/(?:jobs|job-search)/([^/?#]+)").ok())
        .as_ref()
}

/// 从职位页面 URL 中提取职位 ID
///
/// 支持 `/jobs/<id>` 与 `/job-search/<id>` 两种路径，忽略查询串和片段。
pub fn extract_job_id(url: &str) -> Option<String> {
    job_id_pattern()?
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|id| !id.is_empty())
}
