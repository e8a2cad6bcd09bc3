//! 日志工具模块
//!
//! 提供订阅器初始化以及启动、统计信息的输出

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunSummary;

/// 未设置 `RUST_LOG` 时的默认级别
const DEFAULT_FILTER: &str = "info";

/// 初始化 tracing 订阅器
///
/// 优先读取 `RUST_LOG`，否则使用 `info`。重复初始化时静默忽略。
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动投递模式");
    info!("🔎 搜索页: {}", config.search_url);
    info!(
        "📎 附件策略: 简历={} 成绩单={} 求职信={}",
        yes_no(config.policy.include_resume),
        yes_no(config.policy.include_transcript),
        yes_no(config.policy.include_cover_letter)
    );
    info!("📒 申请记录: {}", config.ledger_file.display());
    info!("{}", "=".repeat(60));
}

/// 记录页开始信息
pub fn log_page_start(page_index: usize, total_pages: usize, jobs: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📄 开始处理第 {}/{} 页，共 {} 个职位", page_index + 1, total_pages, jobs);
    info!("{}", "=".repeat(60));
}

/// 记录页完成信息
pub fn log_page_complete(page_index: usize, summary: &RunSummary) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 页完成，累计: 已申请 {} / 已拒绝 {} / 失败 {}",
        page_index + 1,
        summary.applied,
        summary.rejected,
        summary.failed
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已申请: {}/{}", summary.applied, summary.total());
    info!("🚫 已拒绝: {}", summary.rejected);
    info!("❌ 失败: {}", summary.failed);
    info!("📄 处理页数: {}", summary.pages_processed);
    if summary.truncated {
        info!("⚠️ 翻页失败，剩余页面未处理");
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "是"
    } else {
        "否"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("attach your resume", 6), "attach...");
        assert_eq!(truncate_text("短文本", 10), "短文本");
    }
}
