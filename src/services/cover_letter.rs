//! 求职信生成服务 - 业务能力层
//!
//! 只负责"根据简历和职位描述写求职信"能力。申请流程本身不调用它，
//! 上传组件只读取配置中已经存在的求职信文件。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务

use std::path::{Path, PathBuf};

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::LlmError;

const COVER_LETTER_PROMPT: &str = r#"You are a professional career writer.

Task:
Generate a tailored cover letter using the provided CV and job posting.

Requirements:
1. Personalize the letter to the specific company and role.
2. Clearly connect the candidate's skills and achievements to the job requirements.
3. Use a warm, conversational, and confident tone.
4. Keep it concise (400-500 words for the body paragraphs).
5. Do NOT fabricate experience or skills.
6. Extract the candidate's full name, email, phone number, and location from the CV. Use them in the header and signature. NEVER use placeholder text like [Your Name] or [Your Address]; if info is not found, omit it.
7. Do NOT include the employer's address or company address.
8. Format the output as a complete cover letter ready to send (no extra commentary).
9. Return the cover letter formatted in **Markdown**. Use `**bold**` for the candidate's name, `---` for separators, and standard Markdown paragraphs.
10. Use this structure:
   - **Candidate's full name** (bold)
   - Contact info (email, phone, location) separated by " | "
   - Date (e.g. February 12, 2026)
   - Blank line
   - Dear Hiring Manager,
   - Body paragraphs (4-5 paragraphs)
   - Sincerely,
   - **Candidate's full name** (bold)
"#;

const TEMPERATURE: f32 = 0.7;

/// 求职信生成
#[async_trait]
pub trait CoverLetterGenerator: Send + Sync {
    /// 生成求职信并返回文件路径，路径只由职位 ID 决定
    async fn generate(
        &self,
        job_description: &str,
        job_id: &str,
        resume_path: &Path,
    ) -> Result<PathBuf, LlmError>;
}

/// 基于 LLM 的求职信生成
///
/// 输出 Markdown 到 `<cover_letter_dir>/<job_id>.md`
pub struct LlmCoverLetterGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
    output_dir: PathBuf,
}

impl LlmCoverLetterGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            output_dir: config.cover_letter_dir.clone(),
        }
    }

    async fn draft(&self, resume: &str, job_description: &str) -> Result<String, LlmError> {
        debug!("调用 LLM API，模型: {}", self.model_name);

        let api_failed = |e: async_openai::error::OpenAIError| LlmError::ApiCallFailed {
            model: self.model_name.clone(),
            source: Box::new(e),
        };

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(COVER_LETTER_PROMPT)
            .build()
            .map_err(api_failed)?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(format!(
                "CV:\n{}\n\nJob posting:\n{}",
                resume.trim(),
                job_description.trim()
            ))
            .build()
            .map_err(api_failed)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(TEMPERATURE)
            .max_tokens(2048u32)
            .build()
            .map_err(api_failed)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            api_failed(e)
        })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })
    }
}

#[async_trait]
impl CoverLetterGenerator for LlmCoverLetterGenerator {
    async fn generate(
        &self,
        job_description: &str,
        job_id: &str,
        resume_path: &Path,
    ) -> Result<PathBuf, LlmError> {
        let resume = read_resume(resume_path).await?;

        let letter = normalize_punctuation(&self.draft(&resume, job_description).await?);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| LlmError::Io {
                path: self.output_dir.clone(),
                source,
            })?;
        let path = cover_letter_path(&self.output_dir, job_id);
        tokio::fs::write(&path, letter)
            .await
            .map_err(|source| LlmError::Io {
                path: path.clone(),
                source,
            })?;

        info!("✉️ 求职信已生成: {}", path.display());
        Ok(path)
    }
}

/// 读取简历文本
///
/// `.pdf` 文件提取文字层，其他文件按 UTF-8 读取（非法字节替换）
pub async fn read_resume(path: &Path) -> Result<String, LlmError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LlmError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let unreadable = |message: String| LlmError::ResumeUnreadable {
        path: path.to_path_buf(),
        message,
    };

    // 在阻塞线程解析，畸形文件引发的 panic 以 JoinError 返回
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| unreadable(e.to_string()))?
        .map_err(|e| unreadable(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(unreadable("no text layer".to_string()));
    }
    debug!("从 {} 提取简历文本 {} 字符", path.display(), text.chars().count());
    Ok(text)
}

/// 求职信文件路径
pub fn cover_letter_path(dir: &Path, job_id: &str) -> PathBuf {
    dir.join(format!("{}.md", job_id))
}

/// 把排版用的引号、破折号等替换成普通 ASCII 字符
pub fn normalize_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' => out.push('-'),
            '\u{2014}' => out.push_str("--"),
            '\u{2026}' => out.push_str("..."),
            '\u{00a0}' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_punctuation() {
        let text = "\u{201c}Hi\u{201d} \u{2013} it\u{2019}s me\u{2026}\u{00a0}ok \u{2014} bye";
        assert_eq!(normalize_punctuation(text), "\"Hi\" - it's me... ok -- bye");
    }

    /// 生成只有一行文字的单页 PDF
    fn one_line_pdf(line: &str) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_pdf_resume_yields_its_text_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Resume.PDF");
        std::fs::write(&path, one_line_pdf("Jane Doe")).unwrap();

        let text = read_resume(&path).await.unwrap();

        assert!(text.contains("Jane Doe"), "extracted: {:?}", text);
        assert!(!text.contains("%PDF"));
    }

    #[tokio::test]
    async fn test_plain_text_resume_is_read_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, b"Jane Doe\nCaf\xe9 barista").unwrap();

        let text = read_resume(&path).await.unwrap();

        assert_eq!(text, "Jane Doe\nCaf\u{fffd} barista");
    }

    #[tokio::test]
    async fn test_corrupt_pdf_resume_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();

        let err = read_resume(&path).await.unwrap_err();

        assert!(matches!(err, LlmError::ResumeUnreadable { .. }));
        assert!(err.to_string().contains("resume.pdf"));
    }

    #[tokio::test]
    async fn test_missing_resume_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_resume(&dir.path().join("absent.pdf")).await.unwrap_err();
        assert!(matches!(err, LlmError::Io { .. }));
    }

    #[test]
    fn test_path_is_keyed_by_job_id() {
        assert_eq!(
            cover_letter_path(Path::new("documents/cover_letters"), "99999"),
            PathBuf::from("documents/cover_letters/99999.md")
        );
    }

    /// 需要真实的 LLM 服务：
    /// ```bash
    /// cargo test test_generate_cover_letter -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_generate_cover_letter() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = match Config::from_env() {
            Ok(config) => config,
            Err(e) => panic!("需要完整的环境配置: {}", e),
        };
        let dir = tempfile::tempdir().unwrap();
        let resume = dir.path().join("resume.txt");
        std::fs::write(&resume, "Jane Doe | jane@example.com\nPython, REST APIs, teamwork").unwrap();

        let mut generator = LlmCoverLetterGenerator::new(&config);
        generator.output_dir = dir.path().join("letters");

        let path = generator
            .generate(
                "Software Engineer Intern at Acme Corp. Requirements: Python, REST APIs.",
                "99999",
                &resume,
            )
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("letters").join("99999.md"));
        let text = std::fs::read_to_string(&path).unwrap();
        println!("{}", text);
        assert!(text.len() > 50);
    }
}
