//! 分页处理器 - 编排层
//!
//! ## 职责
//!
//! 遍历所有列表页，对每个职位调用 `ApplyFlow`，汇总统计。
//!
//! ## 核心功能
//!
//! 1. **遍历页面**：从第 0 页到最后一页，最后一页之后不再翻页
//! 2. **流程调度**：创建一次 `JobCtx`，交给复用的 `ApplyFlow`
//! 3. **结果记录**：每个职位的结果写入运行日志并计入统计
//! 4. **节流**：两个职位之间固定等待
//!
//! 单个职位的失败不会中断循环；只有致命错误（申请记录写入失败、
//! 无法读取总页数）才会以 `Err` 返回。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::AppResult;
use crate::infrastructure::SessionGateway;
use crate::models::RunSummary;
use crate::services::{JobDiscovery, OutcomeWriter};
use crate::utils::logging;
use crate::workflow::{ApplyFlow, JobCtx};

/// 分页处理器
pub struct PageProcessor<'a> {
    pub discovery: &'a JobDiscovery,
    pub flow: &'a ApplyFlow,
    pub writer: Option<&'a OutcomeWriter>,
    pub inter_job_delay: Duration,
}

impl PageProcessor<'_> {
    /// 处理全部列表页
    ///
    /// 调用前浏览器应已停在搜索结果的第一页
    pub async fn process_all_pages(&self, gateway: &dyn SessionGateway) -> AppResult<RunSummary> {
        let total_pages = self.discovery.page_count(gateway).await?;
        let mut summary = RunSummary::default();

        for page_index in 0..total_pages {
            self.process_page(gateway, page_index, total_pages, &mut summary)
                .await?;
            summary.pages_processed += 1;
            logging::log_page_complete(page_index, &summary);

            let is_last_page = page_index + 1 >= total_pages;
            if is_last_page {
                break;
            }
            if let Err(e) = self.discovery.advance_page(gateway).await {
                error!(
                    "❌ 无法进入第 {} 页，剩余页面跳过: {}",
                    page_index + 2,
                    e
                );
                summary.truncated = true;
                break;
            }
        }

        Ok(summary)
    }

    async fn process_page(
        &self,
        gateway: &dyn SessionGateway,
        page_index: usize,
        total_pages: usize,
        summary: &mut RunSummary,
    ) -> AppResult<()> {
        let urls = match self.discovery.posting_urls(gateway).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("⚠️ 第 {} 页读取职位链接失败: {}", page_index + 1, e);
                Vec::new()
            }
        };
        logging::log_page_start(page_index, total_pages, urls.len());

        let jobs_on_page = urls.len();
        for (index, url) in urls.into_iter().enumerate() {
            let ctx = JobCtx::new(page_index, index + 1, jobs_on_page, url);

            let outcome = self.flow.run(gateway, &ctx).await?;
            summary.record(&outcome);

            if let Some(writer) = self.writer {
                if let Err(e) = writer.write(&ctx, &outcome) {
                    warn!("{} ⚠️ 写入运行日志失败: {}", ctx, e);
                }
            }

            if !self.inter_job_delay.is_zero() {
                sleep(self.inter_job_delay).await;
            }
        }

        Ok(())
    }
}
