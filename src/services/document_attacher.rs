//! 附件上传服务 - 业务能力层
//!
//! 只负责"向已打开的申请弹窗上传附件"能力，不关心流程

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{MissingDocumentError, SessionResult};
use crate::infrastructure::{selectors, PageElement};
use crate::models::{DocumentKind, DocumentPolicy};

/// 表单项标签关键字 → 附件类型
///
/// 按顺序匹配，先出现的关键字优先。简历由门户保存的简历提供，这里不处理
static FIELD_KEYWORDS: phf::OrderedMap<&'static str, DocumentKind> = phf::phf_ordered_map! {
    "transcript" => DocumentKind::Transcript,
    "cover letter" => DocumentKind::CoverLetter,
};

/// 上传确认轮询间隔
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 单个表单项的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAction {
    /// 已上传并看到完成标志
    Uploaded { kind: DocumentKind, path: PathBuf },
    /// 已上传但没等到完成标志
    Unconfirmed { kind: DocumentKind, path: PathBuf },
    /// 策略不包含此类附件，跳过
    SkippedByPolicy(DocumentKind),
    /// 识别出类型但无法上传（找不到文件输入框等）
    Errored { kind: DocumentKind, reason: String },
}

/// 上传结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttachResult {
    /// 弹窗中的表单项总数
    pub fields_seen: usize,
    pub actions: Vec<FieldAction>,
}

impl AttachResult {
    pub fn uploaded(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.actions.iter().filter_map(|a| match a {
            FieldAction::Uploaded { kind, .. } | FieldAction::Unconfirmed { kind, .. } => Some(*kind),
            _ => None,
        })
    }
}

/// 附件上传服务
///
/// 职责：
/// - 遍历弹窗中的表单项，按标签识别附件类型
/// - 策略包含时检查文件存在并上传，等待完成标志
/// - 策略不包含时跳过
/// - 只有"策略要求但文件不存在"会让当前职位失败
pub struct DocumentAttacher {
    confirm_timeout: Duration,
    base_dir: PathBuf,
}

impl DocumentAttacher {
    /// 相对路径以当前工作目录为基准
    pub fn new(confirm_timeout: Duration) -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_base_dir(confirm_timeout, base_dir)
    }

    pub fn with_base_dir(confirm_timeout: Duration, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            confirm_timeout,
            base_dir: base_dir.into(),
        }
    }

    /// 按策略向弹窗上传附件
    pub async fn attach(
        &self,
        modal: &dyn PageElement,
        policy: &DocumentPolicy,
    ) -> Result<AttachResult, MissingDocumentError> {
        info!("📎 检查附件上传要求...");

        let fieldsets = match modal.find_all(&selectors::modal_fieldset()).await {
            Ok(fieldsets) => fieldsets,
            Err(e) => {
                warn!("⚠️ 无法读取弹窗表单项: {}", e);
                return Ok(AttachResult::default());
            }
        };

        let mut result = AttachResult {
            fields_seen: fieldsets.len(),
            actions: Vec::new(),
        };

        if fieldsets.is_empty() {
            info!("该申请没有附件上传项");
            return Ok(result);
        }
        debug!("弹窗中共有 {} 个表单项", fieldsets.len());

        for fieldset in fieldsets.iter() {
            let label = match fieldset.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("⚠️ 无法读取表单项文本: {}", e);
                    continue;
                }
            };

            let Some(kind) = classify_field(&label) else {
                continue;
            };

            if !policy.includes(kind) {
                info!("跳过 {} 上传（策略未包含）", kind.label());
                result.actions.push(FieldAction::SkippedByPolicy(kind));
                continue;
            }

            let Some(configured) = policy.upload_path(kind) else {
                continue;
            };
            let path = self.resolve(configured);
            if !path.is_file() {
                return Err(MissingDocumentError { kind, path });
            }

            let action = self.upload(&**fieldset, kind, path).await;
            result.actions.push(action);
        }

        info!("附件检查完成");
        Ok(result)
    }

    fn resolve(&self, configured: &Path) -> PathBuf {
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.base_dir.join(configured)
        }
    }

    async fn upload(&self, fieldset: &dyn PageElement, kind: DocumentKind, path: PathBuf) -> FieldAction {
        let inputs = match fieldset.find_all(&selectors::file_input()).await {
            Ok(inputs) => inputs,
            Err(e) => {
                return errored(kind, format!("file input lookup failed: {}", e));
            }
        };
        let Some(input) = inputs.first() else {
            warn!("⚠️ {} 表单项中没有文件输入框", kind.label());
            return errored(kind, "no file input in field".to_string());
        };

        info!("⬆️ 上传 {}: {}", kind.label(), path.display());
        if let Err(e) = input.upload_file(&path).await {
            warn!("⚠️ {} 上传失败: {}", kind.label(), e);
            return errored(kind, e.to_string());
        }

        match self.wait_for_confirmation(fieldset).await {
            Ok(true) => {
                info!("✓ {} 上传完成", kind.label());
                FieldAction::Uploaded { kind, path }
            }
            Ok(false) => {
                warn!("⚠️ 未能确认 {} 上传完成，继续提交", kind.label());
                FieldAction::Unconfirmed { kind, path }
            }
            Err(e) => {
                warn!("⚠️ 确认 {} 上传时出错: {}，继续提交", kind.label(), e);
                FieldAction::Unconfirmed { kind, path }
            }
        }
    }

    /// 在限定时间内轮询表单项中的完成标志
    async fn wait_for_confirmation(&self, fieldset: &dyn PageElement) -> SessionResult<bool> {
        let deadline = Instant::now() + self.confirm_timeout;
        loop {
            if !fieldset.find_all(&selectors::upload_checkmark()).await?.is_empty() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

fn errored(kind: DocumentKind, reason: String) -> FieldAction {
    FieldAction::Errored { kind, reason }
}

/// 根据表单项标签识别附件类型
pub fn classify_field(label: &str) -> Option<DocumentKind> {
    let label = label.to_lowercase();
    FIELD_KEYWORDS
        .entries()
        .find(|(keyword, _)| label.contains(*keyword))
        .map(|(_, kind)| *kind)
}
