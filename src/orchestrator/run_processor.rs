//! 运行处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：连接或启动浏览器、创建会话网关、初始化运行日志
//! 2. **登录**：登录失败直接终止，不处理任何职位
//! 3. **分页处理**：委托 `PageProcessor` 遍历所有列表页
//! 4. **全局统计**：写入运行日志并打印汇总
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **严格串行**：一个浏览器会话，一次只处理一个职位

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{ChromiumGateway, SessionGateway};
use crate::models::RunSummary;
use crate::orchestrator::PageProcessor;
use crate::services::{Authenticator, JobDiscovery, OutcomeWriter};
use crate::utils::logging;
use crate::workflow::ApplyFlow;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Option<Browser>,
    gateway: Box<dyn SessionGateway>,
    writer: OutcomeWriter,
}

impl App {
    /// 初始化应用
    ///
    /// 配置了调试端口时连接已有浏览器，否则启动新实例
    pub async fn initialize(config: Config) -> Result<Self> {
        let (browser, page) = match config.browser_debug_port {
            Some(port) => {
                browser::connect_to_browser_and_page(port, Some(&config.login_url)).await?
            }
            None => {
                browser::launch_browser(
                    &config.login_url,
                    config.browser_executable.as_deref(),
                    config.headless,
                )
                .await?
            }
        };

        let gateway = ChromiumGateway::new(page);
        let mut app = Self::with_gateway(config, Box::new(gateway))?;
        app._browser = Some(browser);
        Ok(app)
    }

    /// 使用现成的会话网关初始化应用
    pub fn with_gateway(config: Config, gateway: Box<dyn SessionGateway>) -> Result<Self> {
        let writer = OutcomeWriter::with_path(&config.output_log_file);
        writer
            .init()
            .with_context(|| format!("无法初始化运行日志: {}", config.output_log_file))?;

        Ok(Self {
            config,
            _browser: None,
            gateway,
            writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        logging::log_startup(&self.config);
        let gateway = self.gateway.as_ref();

        Authenticator::new(&self.config).login(gateway).await?;

        info!("🔎 打开搜索页: {}", self.config.search_url);
        gateway
            .navigate(&self.config.search_url)
            .await
            .map_err(|e| AppError::page_load_failed(self.config.search_url.clone(), e))?;

        let discovery = JobDiscovery::new(self.config.wait_timeout);
        let flow = ApplyFlow::new(&self.config);
        let processor = PageProcessor {
            discovery: &discovery,
            flow: &flow,
            writer: Some(&self.writer),
            inter_job_delay: self.config.inter_job_delay,
        };

        let summary = processor.process_all_pages(gateway).await?;

        if let Err(e) = self.writer.write_summary(&summary) {
            warn!("⚠️ 写入运行统计失败: {}", e);
        }
        logging::print_final_stats(&summary, &self.config.output_log_file);

        Ok(summary)
    }
}
