//! chromiumoxide 会话网关 - 基础设施层
//!
//! 唯一持有 Page 的对象，把 [`SessionGateway`] 映射到 CDP 调用

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::{Element, Page};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::infrastructure::{ElementRef, Locator, PageElement, SessionGateway};

/// 轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// chromiumoxide 会话网关
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 把定位器翻译成 CSS / XPath 查询
/// - 实现有界轮询等待
/// - 不认识职位 / 申请记录
pub struct ChromiumGateway {
    page: Page,
}

impl ChromiumGateway {
    /// 创建新的会话网关
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    fn wrap(&self, element: Element) -> ElementRef {
        Box::new(ChromiumElement {
            element,
            page: self.page.clone(),
        })
    }

    async fn query(&self, locator: &Locator) -> SessionResult<Vec<Element>> {
        let found = match locator {
            Locator::Css(selector) => self.page.find_elements(selector.as_str()).await,
            Locator::XPath(expression) => self.page.find_xpaths(expression.as_str()).await,
        };
        // 没有匹配时 CDP 可能返回错误而不是空列表
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => {
                debug!("查询 {} 无结果: {}", locator, e);
                Ok(Vec::new())
            }
        }
    }

    async fn poll(
        &self,
        locator: &Locator,
        timeout: Duration,
        require_clickable: bool,
    ) -> SessionResult<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            for element in self.query(locator).await? {
                if !require_clickable || element.clickable_point().await.is_ok() {
                    return Ok(self.wrap(element));
                }
            }
            if Instant::now() >= deadline {
                return Err(SessionError::ElementNotFound {
                    locator: locator.to_string(),
                    timeout_ms: timeout.as_millis(),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl SessionGateway for ChromiumGateway {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        debug!("导航到: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<ElementRef> {
        self.poll(locator, timeout, true).await
    }

    async fn wait_for_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<ElementRef> {
        self.poll(locator, timeout, false).await
    }

    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>> {
        let elements = self.query(locator).await?;
        Ok(elements.into_iter().map(|e| self.wrap(e)).collect())
    }

    async fn current_url(&self) -> SessionResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }
}

/// chromiumoxide 元素
struct ChromiumElement {
    element: Element,
    page: Page,
}

#[async_trait]
impl PageElement for ChromiumElement {
    async fn click(&self) -> SessionResult<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> SessionResult<()> {
        self.element.click().await?;
        self.element.type_str(text).await?;
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> SessionResult<()> {
        let mut params = SetFileInputFilesParams::new(vec![path.to_string_lossy().to_string()]);
        params.backend_node_id = Some(self.element.backend_node_id);
        self.page.execute(params).await?;
        Ok(())
    }

    async fn attribute(&self, name: &str) -> SessionResult<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn text(&self) -> SessionResult<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }

    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>> {
        let Locator::Css(selector) = locator else {
            return Err(SessionError::UnsupportedLocator(locator.to_string()));
        };
        let children = match self.element.find_elements(selector.as_str()).await {
            Ok(children) => children,
            Err(e) => {
                debug!("元素内查询 {} 无结果: {}", locator, e);
                Vec::new()
            }
        };
        Ok(children
            .into_iter()
            .map(|element| {
                Box::new(ChromiumElement {
                    element,
                    page: self.page.clone(),
                }) as ElementRef
            })
            .collect())
    }
}
