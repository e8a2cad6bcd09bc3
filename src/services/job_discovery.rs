//! 职位发现服务 - 业务能力层
//!
//! 只负责"列表页"能力：总页数、当前页的职位链接、翻页

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, NavigationError};
use crate::infrastructure::{selectors, SessionGateway};

/// 职位发现服务
///
/// 页码在内部从 0 开始。调用方负责在最后一页之后停止，
/// 不应在最后一页调用 [`JobDiscovery::advance_page`]。
pub struct JobDiscovery {
    timeout: Duration,
    /// 最近一次读取链接时所在的列表页地址
    listing_url: Mutex<Option<String>>,
}

impl JobDiscovery {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            listing_url: Mutex::new(None),
        }
    }

    /// 读取分页控件中的总页数
    pub async fn page_count(&self, gateway: &dyn SessionGateway) -> AppResult<usize> {
        let last_page = gateway
            .wait_for_present(&selectors::last_page_button(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("pagination control", e))?;

        let value = last_page
            .attribute("value")
            .await
            .map_err(|e| AppError::action_failed("read pagination value", e))?
            .unwrap_or_default();

        let total = value
            .trim()
            .parse::<usize>()
            .map_err(|_| NavigationError::Unparseable {
                what: "page count".to_string(),
                value: value.clone(),
            })?;

        info!("📄 共 {} 页职位", total);
        Ok(total)
    }

    /// 当前列表页中的职位链接（绝对地址）
    ///
    /// 页面没有任何职位时返回空列表而不是错误
    pub async fn posting_urls(&self, gateway: &dyn SessionGateway) -> AppResult<Vec<String>> {
        if let Ok(url) = gateway.current_url().await {
            self.remember_listing(url);
        }

        if let Err(e) = gateway
            .wait_for_present(&selectors::job_result_card(), self.timeout)
            .await
        {
            warn!("⚠️ 当前页没有职位卡片: {}", e);
            return Ok(Vec::new());
        }

        let links = gateway
            .find_all(&selectors::job_result_link())
            .await
            .map_err(|e| AppError::action_failed("list job links", e))?;

        let mut urls = Vec::with_capacity(links.len());
        for link in links.iter() {
            match link.attribute("href").await {
                Ok(Some(href)) if !href.trim().is_empty() => urls.push(href.trim().to_string()),
                Ok(_) => {}
                Err(e) => warn!("⚠️ 无法读取职位链接: {}", e),
            }
        }

        info!("本页找到 {} 个职位", urls.len());
        Ok(urls)
    }

    /// 翻到下一页
    ///
    /// 打开职位详情会离开列表页，因此先回到记住的列表页地址再点击"下一页"
    pub async fn advance_page(&self, gateway: &dyn SessionGateway) -> AppResult<()> {
        if let Some(listing) = self.listing_url() {
            let here = gateway.current_url().await.unwrap_or_default();
            if here != listing {
                debug!("返回列表页: {}", listing);
                gateway
                    .navigate(&listing)
                    .await
                    .map_err(|e| AppError::page_load_failed(listing.clone(), e))?;
            }
        }

        let next = gateway
            .wait_for_clickable(&selectors::next_page_button(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("next page control", e))?;
        next.click()
            .await
            .map_err(|e| AppError::action_failed("click next page", e))?;

        Ok(())
    }

    fn remember_listing(&self, url: String) {
        if let Ok(mut guard) = self.listing_url.lock() {
            *guard = Some(url);
        }
    }

    fn listing_url(&self) -> Option<String> {
        self.listing_url.lock().ok().and_then(|guard| guard.clone())
    }
}
