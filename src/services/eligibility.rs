//! 申请资格校验 - 业务能力层
//!
//! 根据申请记录和附件策略判断当前职位能否申请。
//!
//! 门户没有提供结构化的"必填附件"信息，只能从申请弹窗的可见文本中查找固定短语，
//! 因此检测本身是启发式的，界面文案改动会导致误判。匹配策略通过
//! [`RequirementDetector`] 抽象，可以替换而不影响流程层。

use std::collections::HashMap;

use tracing::debug;

use crate::models::{DocumentKind, DocumentPolicy, RejectReason};
use crate::services::ApplicationLedger;

/// 附件要求检测
pub trait RequirementDetector: Send + Sync {
    /// 页面文本是否表明该职位要求此类附件
    fn requires(&self, kind: DocumentKind, rendered_text: &str) -> bool;
}

/// 短语匹配检测（不区分大小写的子串匹配）
#[derive(Debug, Clone)]
pub struct PhraseDetector {
    phrases: HashMap<DocumentKind, Vec<String>>,
}

impl PhraseDetector {
    /// 使用默认短语
    pub fn new() -> Self {
        Self::with_overrides(&HashMap::new())
    }

    /// 覆盖部分类型的短语，其余类型使用默认短语
    pub fn with_overrides(overrides: &HashMap<DocumentKind, Vec<String>>) -> Self {
        let phrases = DocumentKind::ALL
            .into_iter()
            .map(|kind| {
                let list = overrides
                    .get(&kind)
                    .cloned()
                    .unwrap_or_else(|| vec![default_phrase(kind).to_string()]);
                let list = list.into_iter().map(|p| p.to_lowercase()).collect();
                (kind, list)
            })
            .collect();
        Self { phrases }
    }
}

impl Default for PhraseDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn default_phrase(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Resume => "attach your resume",
        DocumentKind::Transcript => "attach your transcript",
        DocumentKind::CoverLetter => "attach your cover letter",
    }
}

impl RequirementDetector for PhraseDetector {
    fn requires(&self, kind: DocumentKind, rendered_text: &str) -> bool {
        let haystack = rendered_text.to_lowercase();
        self.phrases
            .get(&kind)
            .map(|list| list.iter().any(|phrase| haystack.contains(phrase.as_str())))
            .unwrap_or(false)
    }
}

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Rejected(RejectReason),
}

/// 资格校验服务
///
/// 规则按顺序执行，遇到第一条不满足的规则立即返回：
/// 1. 已申请过 → 拒绝
/// 2. 要求简历但策略不含简历 → 拒绝
/// 3. 要求成绩单但策略不含成绩单 → 拒绝
/// 4. 要求求职信但策略不含求职信 → 拒绝
pub struct EligibilityValidator {
    detector: Box<dyn RequirementDetector>,
}

impl EligibilityValidator {
    pub fn new(detector: Box<dyn RequirementDetector>) -> Self {
        Self { detector }
    }

    /// 完整校验：先查申请记录，再查附件要求
    pub fn validate(
        &self,
        ledger: &ApplicationLedger,
        job_id: &str,
        policy: &DocumentPolicy,
        rendered_text: &str,
    ) -> Eligibility {
        match self.check_ledger(ledger, job_id) {
            Eligibility::Eligible => self.check_requirements(job_id, policy, rendered_text),
            rejected => rejected,
        }
    }

    /// 只查申请记录，只需要职位 ID
    ///
    /// 流程在点击申请按钮之前调用，已申请的职位不会因为缺少按钮而记为失败
    pub fn check_ledger(&self, ledger: &ApplicationLedger, job_id: &str) -> Eligibility {
        if ledger.contains(job_id) {
            return Eligibility::Rejected(RejectReason::AlreadyApplied);
        }
        Eligibility::Eligible
    }

    /// 按 `DocumentKind::ALL` 的顺序检查页面要求的附件是否都在策略内
    pub fn check_requirements(
        &self,
        job_id: &str,
        policy: &DocumentPolicy,
        rendered_text: &str,
    ) -> Eligibility {
        for kind in DocumentKind::ALL {
            if !policy.includes(kind) && self.detector.requires(kind, rendered_text) {
                debug!("职位 {} 要求 {}，但策略不包含", job_id, kind.label());
                return Eligibility::Rejected(RejectReason::DocumentRequired(kind));
            }
        }

        Eligibility::Eligible
    }
}

impl Default for EligibilityValidator {
    fn default() -> Self {
        Self::new(Box::new(PhraseDetector::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerEntry;
    use std::path::PathBuf;

    fn policy(resume: bool, transcript: bool, cover_letter: bool) -> DocumentPolicy {
        DocumentPolicy {
            include_resume: resume,
            include_transcript: transcript,
            include_cover_letter: cover_letter,
            resume_path: None,
            transcript_path: PathBuf::from("transcript.pdf"),
            cover_letter_path: PathBuf::from("cover_letter.pdf"),
        }
    }

    fn empty_ledger() -> (tempfile::TempDir, ApplicationLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ApplicationLedger::with_path(dir.path().join("jobs.csv"));
        (dir, ledger)
    }

    const ALL_REQUIRED: &str =
        "Attach your resume\nAttach your transcript\nATTACH YOUR COVER LETTER\nSubmit Application";

    #[test]
    fn test_accepts_when_nothing_required() {
        let (_dir, ledger) = empty_ledger();
        let validator = EligibilityValidator::default();
        let result = validator.validate(&ledger, "1", &policy(false, false, false), "Submit Application");
        assert_eq!(result, Eligibility::Eligible);
    }

    #[test]
    fn test_accepts_when_policy_covers_all_requirements() {
        let (_dir, ledger) = empty_ledger();
        let validator = EligibilityValidator::default();
        let result = validator.validate(&ledger, "1", &policy(true, true, true), ALL_REQUIRED);
        assert_eq!(result, Eligibility::Eligible);
    }

    #[test]
    fn test_each_excluded_document_rejects_with_its_name() {
        let (_dir, ledger) = empty_ledger();
        let validator = EligibilityValidator::default();

        let cases = [
            (policy(false, true, true), "resume"),
            (policy(true, false, true), "transcript"),
            (policy(true, true, false), "cover letter"),
        ];
        for (p, expected) in cases {
            match validator.validate(&ledger, "1", &p, ALL_REQUIRED) {
                Eligibility::Rejected(reason) => assert!(
                    reason.to_string().contains(expected),
                    "reason '{}' should mention {}",
                    reason,
                    expected
                ),
                Eligibility::Eligible => panic!("expected rejection for {}", expected),
            }
        }
    }

    #[test]
    fn test_rules_short_circuit_in_order() {
        let (_dir, ledger) = empty_ledger();
        let validator = EligibilityValidator::default();
        let result = validator.validate(&ledger, "1", &policy(false, false, false), ALL_REQUIRED);
        assert_eq!(
            result,
            Eligibility::Rejected(RejectReason::DocumentRequired(DocumentKind::Resume))
        );
    }

    #[test]
    fn test_already_applied_wins_over_everything() {
        let (_dir, ledger) = empty_ledger();
        ledger
            .append(&LedgerEntry {
                job_id: "123456".to_string(),
                company: None,
                title: None,
                resume: true,
                transcript: false,
                cover_letter: false,
                date: "01/02".to_string(),
            })
            .unwrap();

        let validator = EligibilityValidator::default();
        let result = validator.validate(&ledger, "123456", &policy(false, false, false), ALL_REQUIRED);
        assert_eq!(result, Eligibility::Rejected(RejectReason::AlreadyApplied));

        // 不需要页面文本也能判定
        assert_eq!(
            validator.check_ledger(&ledger, "123456"),
            Eligibility::Rejected(RejectReason::AlreadyApplied)
        );
        assert_eq!(validator.check_ledger(&ledger, "654321"), Eligibility::Eligible);
    }

    #[test]
    fn test_custom_phrases_replace_defaults_per_kind() {
        let overrides = HashMap::from([(
            DocumentKind::Transcript,
            vec!["Upload Official Transcript".to_string()],
        )]);
        let detector = PhraseDetector::with_overrides(&overrides);

        assert!(detector.requires(DocumentKind::Transcript, "please upload official transcript"));
        assert!(!detector.requires(DocumentKind::Transcript, "Attach your transcript"));
        assert!(detector.requires(DocumentKind::Resume, "Attach your resume"));
    }
}
