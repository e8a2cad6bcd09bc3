//! 运行日志写入服务 - 业务能力层
//!
//! 只负责"写 output.txt"能力，不关心流程

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::models::{ApplicationOutcome, RunSummary};
use crate::workflow::JobCtx;

/// 运行日志写入服务
///
/// 职责：
/// - 运行开始时写入表头（覆盖上次的日志）
/// - 每个职位处理完追加一行
/// - 运行结束时追加统计
pub struct OutcomeWriter {
    path: PathBuf,
}

impl OutcomeWriter {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 写入运行日志表头
    pub fn init(&self) -> Result<()> {
        let header = format!(
            "{}\n职位申请日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.path, header)?;
        Ok(())
    }

    /// 追加单个职位的结果
    pub fn write(&self, ctx: &JobCtx, outcome: &ApplicationOutcome) -> Result<()> {
        debug!("写入运行日志: {} {}", ctx, outcome.state);
        self.append(&format!("{} {}\n", ctx, outcome))
    }

    /// 追加运行统计
    pub fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        let mut text = format!(
            "\n{}\n完成时间: {}\n已申请: {} | 已拒绝: {} | 失败: {} | 页数: {}\n",
            "-".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            summary.applied,
            summary.rejected,
            summary.failed,
            summary.pages_processed
        );
        if summary.truncated {
            text.push_str("翻页失败，运行提前结束\n");
        }
        self.append(&text)
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}
