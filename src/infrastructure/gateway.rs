//! 会话能力接口
//!
//! 描述"远端页面能做什么"：跳转、等待、查找、点击、输入、读取。
//! 不认识职位、申请记录或附件策略。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::infrastructure::Locator;

/// 页面元素句柄
pub type ElementRef = Box<dyn PageElement>;

/// 页面上的单个元素
#[async_trait]
pub trait PageElement: Send + Sync {
    async fn click(&self) -> SessionResult<()>;

    async fn send_keys(&self, text: &str) -> SessionResult<()>;

    /// 向文件输入框提交本地文件
    async fn upload_file(&self, path: &Path) -> SessionResult<()>;

    async fn attribute(&self, name: &str) -> SessionResult<Option<String>>;

    /// 元素的可见文本
    async fn text(&self) -> SessionResult<String>;

    /// 在元素内部查找，只支持 CSS 定位
    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>>;
}

/// 浏览器会话
///
/// 所有等待都是有界轮询，超时返回 `SessionError::ElementNotFound`。
#[async_trait]
pub trait SessionGateway: Send + Sync {
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    async fn wait_for_clickable(&self, locator: &Locator, timeout: Duration)
        -> SessionResult<ElementRef>;

    async fn wait_for_present(&self, locator: &Locator, timeout: Duration)
        -> SessionResult<ElementRef>;

    /// 立即查找，不等待；没有匹配时返回空列表
    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>>;

    async fn current_url(&self) -> SessionResult<String>;
}
