use std::fmt;

use crate::models::DocumentKind;

/// 单个职位在处理流程中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Opened,
    DetailsParsed,
    Eligible,
    DocumentsAttached,
    Submitted,
    /// 已提交并写入申请记录
    Logged,
    /// 不符合条件，未提交
    Rejected,
    /// 处理过程中出错，未提交
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Opened => "opened",
            JobState::DetailsParsed => "details-parsed",
            JobState::Eligible => "eligible",
            JobState::DocumentsAttached => "documents-attached",
            JobState::Submitted => "submitted",
            JobState::Logged => "logged",
            JobState::Rejected => "rejected",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyApplied,
    ExternalApplication,
    /// 职位要求某类附件，但策略不包含
    DocumentRequired(DocumentKind),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::AlreadyApplied => f.write_str("already applied"),
            RejectReason::ExternalApplication => f.write_str("external application"),
            RejectReason::DocumentRequired(kind) => write!(
                f,
                "job requires {} but policy excludes it",
                kind.label()
            ),
        }
    }
}

/// 单个职位的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationOutcome {
    pub url: String,
    /// 解析 ID 之前失败时为空
    pub job_id: Option<String>,
    pub state: JobState,
    pub success: bool,
    pub reason: String,
}

impl ApplicationOutcome {
    pub fn logged(url: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            job_id: Some(job_id.into()),
            state: JobState::Logged,
            success: true,
            reason: "applied successfully".to_string(),
        }
    }

    pub fn rejected(url: impl Into<String>, job_id: Option<String>, reason: RejectReason) -> Self {
        Self {
            url: url.into(),
            job_id,
            state: JobState::Rejected,
            success: false,
            reason: reason.to_string(),
        }
    }

    pub fn failed(url: impl Into<String>, job_id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            job_id,
            state: JobState::Failed,
            success: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ApplicationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.job_id.as_deref().unwrap_or("-"),
            self.state,
            self.reason,
            self.url
        )
    }
}

/// 整次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub failed: usize,
    pub pages_processed: usize,
    /// 翻页失败导致提前结束
    pub truncated: bool,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ApplicationOutcome) {
        match outcome.state {
            JobState::Logged => self.applied += 1,
            JobState::Rejected => self.rejected += 1,
            _ => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.applied + self.rejected + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reasons_name_the_document() {
        let r = RejectReason::DocumentRequired(DocumentKind::Resume).to_string();
        assert!(r.contains("resume"));
        let t = RejectReason::DocumentRequired(DocumentKind::Transcript).to_string();
        assert!(t.contains("transcript"));
        let c = RejectReason::DocumentRequired(DocumentKind::CoverLetter).to_string();
        assert!(c.contains("cover letter"));
        assert_eq!(RejectReason::AlreadyApplied.to_string(), "already applied");
    }

    #[test]
    fn test_summary_counts_by_terminal_state() {
        let mut summary = RunSummary::default();
        summary.record(&ApplicationOutcome::logged("u1", "1"));
        summary.record(&ApplicationOutcome::rejected(
            "u2",
            Some("2".to_string()),
            RejectReason::ExternalApplication,
        ));
        summary.record(&ApplicationOutcome::failed("u3", None, "boom"));
        summary.record(&ApplicationOutcome::failed("u4", None, "boom"));

        assert_eq!(summary.applied, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total(), 4);
    }
}
