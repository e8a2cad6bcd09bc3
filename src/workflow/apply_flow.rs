//! 职位申请流程 - 流程层
//!
//! 核心职责：定义"一个职位"的完整处理流程
//!
//! 状态顺序：
//! 1. Opened：打开职位详情页
//! 2. DetailsParsed：解析职位 ID / 职位名 / 公司
//! 3. Eligible：先查申请记录，再打开申请弹窗校验附件要求（站外申请直接拒绝）
//! 4. DocumentsAttached：按策略上传附件
//! 5. Submitted：点击提交
//! 6. Logged：写入申请记录
//!
//! 任何一步都可能转入 Rejected 或 Failed。除了申请记录写入失败，
//! 其他错误都转换成 Failed 结果返回，不会向上传播。

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::infrastructure::{selectors, ElementRef, Locator, SessionGateway};
use crate::models::{
    extract_job_id, ApplicationOutcome, DocumentPolicy, JobPosting, JobState, LedgerEntry,
    RejectReason,
};
use crate::services::{
    ApplicationLedger, DocumentAttacher, Eligibility, EligibilityValidator, PhraseDetector,
};
use crate::utils::truncate_text;
use crate::workflow::JobCtx;

/// 职位申请流程
///
/// - 编排单个职位的状态流转
/// - 决定何时校验、何时上传、何时提交、何时记录
/// - 不持有任何浏览器资源（gateway 由调用方传入）
/// - 只依赖业务能力（services）
pub struct ApplyFlow {
    ledger: ApplicationLedger,
    validator: EligibilityValidator,
    attacher: DocumentAttacher,
    policy: DocumentPolicy,
    timeout: Duration,
}

/// 流程推进中的可变信息，用于失败时报告
struct Progress {
    state: JobState,
    job_id: Option<String>,
}

impl ApplyFlow {
    /// 创建新的申请流程
    pub fn new(config: &Config) -> Self {
        let detector = PhraseDetector::with_overrides(&config.requirement_phrases);
        Self {
            ledger: ApplicationLedger::with_path(&config.ledger_file),
            validator: EligibilityValidator::new(Box::new(detector)),
            attacher: DocumentAttacher::new(config.wait_timeout),
            policy: config.policy.clone(),
            timeout: config.wait_timeout,
        }
    }

    pub fn ledger(&self) -> &ApplicationLedger {
        &self.ledger
    }

    /// 处理单个职位
    ///
    /// 只有致命错误（申请记录写入失败）以 `Err` 返回
    pub async fn run(
        &self,
        gateway: &dyn SessionGateway,
        ctx: &JobCtx,
    ) -> AppResult<ApplicationOutcome> {
        let mut progress = Progress {
            state: JobState::Opened,
            job_id: None,
        };

        match self.advance(gateway, ctx, &mut progress).await {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_fatal() => {
                error!("{} ❌ 致命错误 (状态: {}): {}", ctx, progress.state, e);
                Err(e)
            }
            Err(e) => {
                warn!("{} ⚠️ 处理失败 (状态: {}): {}", ctx, progress.state, e);
                Ok(ApplicationOutcome::failed(
                    ctx.url.clone(),
                    progress.job_id,
                    e.to_string(),
                ))
            }
        }
    }

    async fn advance(
        &self,
        gateway: &dyn SessionGateway,
        ctx: &JobCtx,
        progress: &mut Progress,
    ) -> AppResult<ApplicationOutcome> {
        // ========== Opened ==========
        self.open_posting(gateway, &ctx.url).await?;

        // ========== DetailsParsed ==========
        let posting = match self.parse_details(gateway, ctx).await? {
            Some(posting) => posting,
            None => {
                return Ok(ApplicationOutcome::failed(
                    ctx.url.clone(),
                    None,
                    "job id could not be extracted from the posting url",
                ));
            }
        };
        progress.job_id = Some(posting.job_id.clone());
        progress.state = JobState::DetailsParsed;
        info!("{} 正在申请: {}", ctx, posting.describe());

        // 已申请的职位不再查找申请按钮
        if let Eligibility::Rejected(reason) =
            self.validator.check_ledger(&self.ledger, &posting.job_id)
        {
            info!("{} 已申请过，跳过", ctx);
            return Ok(self.reject(ctx, &posting, reason));
        }

        // 站外申请在读取弹窗之前直接拒绝
        let apply_button = match self.find_apply_button(gateway).await? {
            ApplyControl::Internal(button) => button,
            ApplyControl::External => {
                info!("{} 站外申请，跳过", ctx);
                return Ok(self.reject(ctx, &posting, RejectReason::ExternalApplication));
            }
        };

        // ========== Eligible ==========
        apply_button
            .click()
            .await
            .map_err(|e| AppError::action_failed("click apply", e))?;
        gateway
            .wait_for_clickable(&selectors::submit_application_button(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("submit application button", e))?;
        let modal = gateway
            .wait_for_present(&selectors::apply_modal(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("application modal", e))?;
        let requirements = modal
            .text()
            .await
            .map_err(|e| AppError::action_failed("read application modal", e))?;
        debug!("{} 申请弹窗内容: {}", ctx, truncate_text(&requirements, 120));

        if let Eligibility::Rejected(reason) =
            self.validator
                .check_requirements(&posting.job_id, &self.policy, &requirements)
        {
            info!("{} 不符合申请条件: {}", ctx, reason);
            return Ok(self.reject(ctx, &posting, reason));
        }
        progress.state = JobState::Eligible;

        // ========== DocumentsAttached ==========
        let attached = self.attacher.attach(&*modal, &self.policy).await?;
        info!(
            "{} 附件处理完成: {} 个表单项, 上传 {} 个",
            ctx,
            attached.fields_seen,
            attached.uploaded().count()
        );
        progress.state = JobState::DocumentsAttached;

        // ========== Submitted ==========
        let submit = gateway
            .wait_for_clickable(&selectors::submit_application_button(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("submit application button", e))?;
        submit
            .click()
            .await
            .map_err(|e| AppError::action_failed("click submit", e))?;
        progress.state = JobState::Submitted;
        info!("{} 📤 已提交申请", ctx);

        // ========== Logged ==========
        let entry = LedgerEntry::new(&posting, &self.policy, chrono::Local::now().date_naive());
        self.ledger.append(&entry)?;
        progress.state = JobState::Logged;
        info!("{} ✅ 申请成功", ctx);

        Ok(ApplicationOutcome::logged(ctx.url.clone(), posting.job_id))
    }

    /// 打开职位详情页并等待加载完成
    async fn open_posting(&self, gateway: &dyn SessionGateway, url: &str) -> AppResult<()> {
        gateway
            .navigate(url)
            .await
            .map_err(|e| AppError::page_load_failed(url, e))?;
        gateway
            .wait_for_clickable(&selectors::share_button(), self.timeout)
            .await
            .map_err(|e| AppError::element_not_found("job details page", e))?;
        Ok(())
    }

    /// 解析职位信息
    ///
    /// 职位名和公司读取失败时记为空；职位 ID 无法解析时返回 `None`
    async fn parse_details(
        &self,
        gateway: &dyn SessionGateway,
        ctx: &JobCtx,
    ) -> AppResult<Option<JobPosting>> {
        let current_url = gateway
            .current_url()
            .await
            .map_err(|e| AppError::action_failed("read current url", e))?;

        let Some(job_id) = extract_job_id(&current_url) else {
            warn!("{} 无法从 {} 解析职位 ID", ctx, current_url);
            return Ok(None);
        };

        let company = match first(gateway, &selectors::employer_link()).await {
            Some(link) => link.attribute("aria-label").await.ok().flatten(),
            None => None,
        };
        if company.is_none() {
            warn!("{} 无法读取公司名称", ctx);
        }

        let title = match first(gateway, &selectors::job_title()).await {
            Some(heading) => heading
                .text()
                .await
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            None => None,
        };
        if title.is_none() {
            warn!("{} 无法读取职位名称", ctx);
        }

        Ok(Some(JobPosting {
            job_id,
            title,
            company,
            url: current_url,
        }))
    }

    async fn find_apply_button(&self, gateway: &dyn SessionGateway) -> AppResult<ApplyControl> {
        if let Some(button) = first(gateway, &selectors::apply_button()).await {
            return Ok(ApplyControl::Internal(button));
        }
        if first(gateway, &selectors::apply_externally_button())
            .await
            .is_some()
        {
            return Ok(ApplyControl::External);
        }
        Err(AppError::element_not_found(
            "apply button",
            SessionError::ElementNotFound {
                locator: selectors::apply_button().to_string(),
                timeout_ms: 0,
            },
        ))
    }

    fn reject(
        &self,
        ctx: &JobCtx,
        posting: &JobPosting,
        reason: RejectReason,
    ) -> ApplicationOutcome {
        ApplicationOutcome::rejected(ctx.url.clone(), Some(posting.job_id.clone()), reason)
    }
}

enum ApplyControl {
    Internal(ElementRef),
    External,
}

/// 立即查找第一个匹配的元素，查找出错视为不存在
async fn first(gateway: &dyn SessionGateway, locator: &Locator) -> Option<ElementRef> {
    gateway
        .find_all(locator)
        .await
        .ok()
        .and_then(|elements| elements.into_iter().next())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::fakes::{ApplyMode, FakePortal, FakePosting, PORTAL_BASE};

    fn config(dir: &std::path::Path) -> Config {
        let env = HashMap::from([
            ("LOGIN_URL", "https://app.joinhandshake.com/login".to_string()),
            ("SEARCH_URL", "https://app.joinhandshake.com/job-search?page=1".to_string()),
            ("USERNAME", "student".to_string()),
            ("PASSWORD", "secret".to_string()),
            ("INCLUDE_RESUME", "true".to_string()),
            ("INCLUDE_TRANSCRIPT", "false".to_string()),
            ("INCLUDE_COVER_LETTER", "false".to_string()),
            ("TRANSCRIPT_PATH", "transcript.pdf".to_string()),
            ("COVER_LETTER_PATH", "cover_letter.pdf".to_string()),
        ]);
        let mut config = Config::from_sources(|key| env.get(key).cloned(), None).unwrap();
        config.ledger_file = dir.join("jobs.csv");
        config.wait_timeout = Duration::from_millis(50);
        config
    }

    #[tokio::test]
    async fn test_logged_job_is_rejected_on_next_visit() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ApplyFlow::new(&config(dir.path()));
        let portal = FakePortal::new().with_page(vec![FakePosting::new("9001")]);
        let ctx = JobCtx::new(0, 1, 1, format!("{}/jobs/9001", PORTAL_BASE));

        let first = flow.run(&portal, &ctx).await.unwrap();
        assert_eq!(first.state, JobState::Logged);
        assert!(first.success);
        assert!(flow.ledger().contains("9001"));

        let second = flow.run(&portal, &ctx).await.unwrap();
        assert_eq!(second.state, JobState::Rejected);
        assert_eq!(second.reason, "already applied");
        assert_eq!(portal.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_ledgered_job_without_apply_control_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ApplyFlow::new(&config(dir.path()));
        let posting = JobPosting {
            job_id: "9002".to_string(),
            title: None,
            company: None,
            url: format!("{}/jobs/9002", PORTAL_BASE),
        };
        flow.ledger()
            .append(&LedgerEntry::new(
                &posting,
                &flow.policy,
                chrono::Local::now().date_naive(),
            ))
            .unwrap();

        let portal = FakePortal::new()
            .with_page(vec![FakePosting::new("9002").apply(ApplyMode::Missing)]);
        let ctx = JobCtx::new(0, 1, 1, posting.url.clone());

        let outcome = flow.run(&portal, &ctx).await.unwrap();

        assert_eq!(outcome.state, JobState::Rejected);
        assert_eq!(outcome.reason, "already applied");
        assert_eq!(outcome.job_id.as_deref(), Some("9002"));
        assert!(portal.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_posting_fails_without_job_id() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ApplyFlow::new(&config(dir.path()));
        let portal = FakePortal::new();
        let ctx = JobCtx::new(0, 1, 1, "https://elsewhere.example/jobs/1");

        let outcome = flow.run(&portal, &ctx).await.unwrap();

        assert_eq!(outcome.state, JobState::Failed);
        assert!(!outcome.success);
        assert!(outcome.job_id.is_none());
        assert!(outcome.reason.contains("navigation error"));
    }

    #[tokio::test]
    async fn test_broken_details_page_fails_before_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let flow = ApplyFlow::new(&config(dir.path()));
        let portal = FakePortal::new().with_page(vec![FakePosting::new("12").broken()]);
        let ctx = JobCtx::new(0, 1, 1, format!("{}/jobs/12", PORTAL_BASE));

        let outcome = flow.run(&portal, &ctx).await.unwrap();

        assert_eq!(outcome.state, JobState::Failed);
        assert!(outcome.job_id.is_none());
        assert!(!flow.ledger().path().exists());
    }
}
