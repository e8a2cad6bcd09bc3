//! 职位处理上下文
//!
//! 封装"我正在处理第几页的第几个职位"这一信息

use std::fmt::Display;

/// 职位处理上下文
#[derive(Debug, Clone)]
pub struct JobCtx {
    /// 列表页索引（从0开始）
    pub page_index: usize,

    /// 职位在本页中的序号（从1开始）
    pub job_index: usize,

    /// 本页职位总数
    pub jobs_on_page: usize,

    /// 职位详情页地址
    pub url: String,
}

impl JobCtx {
    pub fn new(
        page_index: usize,
        job_index: usize,
        jobs_on_page: usize,
        url: impl Into<String>,
    ) -> Self {
        Self {
            page_index,
            job_index,
            jobs_on_page,
            url: url.into(),
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[第 {} 页 #{}/{}]",
            self.page_index + 1,
            self.job_index,
            self.jobs_on_page
        )
    }
}
