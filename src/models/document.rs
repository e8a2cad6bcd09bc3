use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 申请附件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// 简历
    Resume,
    /// 成绩单
    Transcript,
    /// 求职信
    CoverLetter,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Resume,
        DocumentKind::Transcript,
        DocumentKind::CoverLetter,
    ];

    /// 小写显示名称（用于日志和拒绝原因）
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::Transcript => "transcript",
            DocumentKind::CoverLetter => "cover letter",
        }
    }
}

/// 附件策略
///
/// 运行开始前加载一次，整个运行期间只读。简历路径只供求职信生成器使用，
/// 上传组件不会读取它。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPolicy {
    pub include_resume: bool,
    pub include_transcript: bool,
    pub include_cover_letter: bool,
    pub resume_path: Option<PathBuf>,
    pub transcript_path: PathBuf,
    pub cover_letter_path: PathBuf,
}

impl DocumentPolicy {
    /// 策略是否包含该类附件
    pub fn includes(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Resume => self.include_resume,
            DocumentKind::Transcript => self.include_transcript,
            DocumentKind::CoverLetter => self.include_cover_letter,
        }
    }

    /// 上传组件负责的附件路径；简历不在其中
    pub fn upload_path(&self, kind: DocumentKind) -> Option<&PathBuf> {
        match kind {
            DocumentKind::Resume => None,
            DocumentKind::Transcript => Some(&self.transcript_path),
            DocumentKind::CoverLetter => Some(&self.cover_letter_path),
        }
    }
}
