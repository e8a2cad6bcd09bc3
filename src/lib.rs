//! # Auto Apply Submit
//!
//! 一个用于在招聘门户上自动投递职位申请的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露会话能力
//! - `SessionGateway` / `PageElement` - 跳转、等待、查找、点击、输入、读取
//! - `ChromiumGateway` - 基于 chromiumoxide 的实现
//! - `selectors` - 门户页面元素的定位
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `Authenticator` - 登录与等待二次验证
//! - `JobDiscovery` - 总页数、职位链接、翻页
//! - `ApplicationLedger` - 只追加的申请记录（jobs.csv）
//! - `EligibilityValidator` - 根据申请记录和附件策略判断能否申请
//! - `DocumentAttacher` - 按策略上传附件
//! - `OutcomeWriter` - 写 output.txt 能力
//! - `CoverLetterGenerator` - LLM 生成求职信
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个职位"的完整处理流程
//! - `JobCtx` - 上下文封装（页码 + 职位序号）
//! - `ApplyFlow` - 状态流转（打开 → 解析 → 校验 → 上传 → 提交 → 记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/run_processor` - 一次完整运行，管理浏览器资源
//! - `orchestrator/page_processor` - 遍历列表页，隔离单个职位的失败
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod fakes;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromiumGateway, Locator, SessionGateway};
pub use models::{ApplicationOutcome, DocumentPolicy, JobPosting, LedgerEntry, RunSummary};
pub use orchestrator::{App, PageProcessor};
pub use workflow::{ApplyFlow, JobCtx};
