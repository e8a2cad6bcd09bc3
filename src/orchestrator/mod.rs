//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次运行和分页调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `run_processor` - 运行处理器
//! - 管理应用生命周期（初始化、登录、运行）
//! - 管理浏览器资源（Browser、ChromiumGateway）
//! - 输出全局统计信息
//!
//! ### `page_processor` - 分页处理器
//! - 遍历所有列表页的职位链接
//! - 复用同一个 ApplyFlow
//! - 翻页失败时提前结束并标记
//!
//! ## 层次关系
//!
//! ```text
//! run_processor (一次运行)
//!     ↓
//! page_processor (处理 Vec<页>)
//!     ↓
//! workflow::ApplyFlow (处理单个职位)
//!     ↓
//! services (能力层：ledger / eligibility / attacher / discovery)
//!     ↓
//! infrastructure (基础设施：SessionGateway)
//! ```

pub mod page_processor;
pub mod run_processor;

// 重新导出主要类型
pub use page_processor::PageProcessor;
pub use run_processor::App;
