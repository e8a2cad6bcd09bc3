//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面），只向上暴露"会话能力"。
//! 上层只依赖 [`SessionGateway`] / [`PageElement`] 两个 trait，
//! 不直接接触 chromiumoxide。

pub mod chromium_gateway;
pub mod gateway;
pub mod locator;
pub mod selectors;

pub use chromium_gateway::ChromiumGateway;
pub use gateway::{ElementRef, PageElement, SessionGateway};
pub use locator::Locator;
