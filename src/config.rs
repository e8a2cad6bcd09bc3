//! 程序配置
//!
//! 启动时加载一次，之后以只读引用传给各组件。
//!
//! 读取顺序：`.env` → 进程环境变量 → `APPLY_CONFIG` 指向的 TOML 文件。
//! 同名配置以环境变量为准；TOML 中的键为环境变量名的小写形式。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{DocumentKind, DocumentPolicy};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 门户 ---
    pub login_url: String,
    pub search_url: String,
    pub username: String,
    pub password: String,
    /// 登录完成后 URL 中应包含的域名
    pub portal_domain: String,

    // --- 附件 ---
    pub policy: DocumentPolicy,
    /// 自定义的附件要求短语，未配置的类型使用默认短语
    pub requirement_phrases: HashMap<DocumentKind, Vec<String>>,

    // --- 输出 ---
    /// 申请记录文件
    pub ledger_file: PathBuf,
    /// 运行日志文件
    pub output_log_file: String,

    // --- 浏览器 ---
    /// 设置后连接已打开的浏览器，否则自行启动
    pub browser_debug_port: Option<u16>,
    pub browser_executable: Option<PathBuf>,
    pub headless: bool,

    // --- 等待与节流 ---
    pub wait_timeout: Duration,
    /// 等待人工完成二次验证的时长
    pub mfa_timeout: Duration,
    pub inter_job_delay: Duration,

    // --- 求职信生成 ---
    pub cover_letter_dir: PathBuf,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

const DEFAULT_PORTAL_DOMAIN: &str = "joinhandshake.com";
const DEFAULT_LEDGER_FILE: &str = "jobs.csv";
const DEFAULT_OUTPUT_LOG_FILE: &str = "output.txt";
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MFA_TIMEOUT_SECS: u64 = 300;
const DEFAULT_INTER_JOB_DELAY_SECS: u64 = 5;
const DEFAULT_COVER_LETTER_DIR: &str = "documents/cover_letters";
const DEFAULT_LLM_API_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL_NAME: &str = "gpt-4.1-nano";

impl Config {
    /// 从 `.env`、环境变量和可选的 TOML 文件加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match std::env::var("APPLY_CONFIG") {
            Ok(path) => Some(load_toml_table(Path::new(&path))?),
            Err(_) => None,
        };

        Self::from_sources(|key| std::env::var(key).ok(), file.as_ref())
    }

    /// 由任意键值来源构建配置
    ///
    /// `env` 优先于 `file`。缺少必需项或无法解析时返回错误。
    pub fn from_sources<F>(env: F, file: Option<&toml::Table>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { env, file };

        let policy = DocumentPolicy {
            include_resume: source.required_bool("INCLUDE_RESUME")?,
            include_transcript: source.required_bool("INCLUDE_TRANSCRIPT")?,
            include_cover_letter: source.required_bool("INCLUDE_COVER_LETTER")?,
            resume_path: source.get("RESUME_PATH").map(PathBuf::from),
            transcript_path: PathBuf::from(source.required("TRANSCRIPT_PATH")?),
            cover_letter_path: PathBuf::from(source.required("COVER_LETTER_PATH")?),
        };

        Ok(Self {
            login_url: source.required("LOGIN_URL")?,
            search_url: source.required("SEARCH_URL")?,
            username: source.required("USERNAME")?,
            password: source.required("PASSWORD")?,
            portal_domain: source
                .get("PORTAL_DOMAIN")
                .unwrap_or_else(|| DEFAULT_PORTAL_DOMAIN.to_string()),
            policy,
            requirement_phrases: source.requirement_phrases()?,
            ledger_file: PathBuf::from(
                source
                    .get("LEDGER_FILE")
                    .unwrap_or_else(|| DEFAULT_LEDGER_FILE.to_string()),
            ),
            output_log_file: source
                .get("OUTPUT_LOG_FILE")
                .unwrap_or_else(|| DEFAULT_OUTPUT_LOG_FILE.to_string()),
            browser_debug_port: source.optional_parse::<u16>("BROWSER_DEBUG_PORT", "u16")?,
            browser_executable: source.get("BROWSER_EXECUTABLE").map(PathBuf::from),
            headless: source.optional_bool("HEADLESS")?.unwrap_or(false),
            wait_timeout: source.secs("WAIT_TIMEOUT_SECS", DEFAULT_WAIT_TIMEOUT_SECS)?,
            mfa_timeout: source.secs("MFA_TIMEOUT_SECS", DEFAULT_MFA_TIMEOUT_SECS)?,
            inter_job_delay: source.secs("INTER_JOB_DELAY_SECS", DEFAULT_INTER_JOB_DELAY_SECS)?,
            cover_letter_dir: PathBuf::from(
                source
                    .get("COVER_LETTER_DIR")
                    .unwrap_or_else(|| DEFAULT_COVER_LETTER_DIR.to_string()),
            ),
            llm_api_key: source.get("LLM_API_KEY").unwrap_or_default(),
            llm_api_base_url: source
                .get("LLM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_API_BASE_URL.to_string()),
            llm_model_name: source
                .get("LLM_MODEL_NAME")
                .unwrap_or_else(|| DEFAULT_LLM_MODEL_NAME.to_string()),
        })
    }
}

fn load_toml_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileInvalid {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    content
        .parse::<toml::Table>()
        .map_err(|e| ConfigError::FileInvalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

struct Source<'a, F> {
    env: F,
    file: Option<&'a toml::Table>,
}

impl<'a, F> Source<'a, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = (self.env)(key).filter(|v| !v.trim().is_empty()) {
            return Some(value.trim().to_string());
        }
        let value = self.file?.get(&key.to_ascii_lowercase())?;
        match value {
            toml::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            toml::Value::String(_) => None,
            toml::Value::Boolean(b) => Some(b.to_string()),
            toml::Value::Integer(i) => Some(i.to_string()),
            toml::Value::Float(f) => Some(f.to_string()),
            _ => None,
        }
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::EnvVarNotFound {
            var_name: key.to_string(),
        })
    }

    fn required_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.required(key)?;
        parse_bool(&value).ok_or_else(|| ConfigError::EnvVarParseFailed {
            var_name: key.to_string(),
            value,
            expected_type: "bool".to_string(),
        })
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => parse_bool(&value)
                .map(Some)
                .ok_or_else(|| ConfigError::EnvVarParseFailed {
                    var_name: key.to_string(),
                    value,
                    expected_type: "bool".to_string(),
                }),
        }
    }

    fn optional_parse<T: std::str::FromStr>(
        &self,
        key: &str,
        expected_type: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::EnvVarParseFailed {
                    var_name: key.to_string(),
                    value,
                    expected_type: expected_type.to_string(),
                }),
        }
    }

    fn secs(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        let secs = self
            .optional_parse::<u64>(key, "seconds")?
            .unwrap_or(default);
        Ok(Duration::from_secs(secs))
    }

    /// `[requirement_phrases]` 表，仅支持 TOML 文件
    fn requirement_phrases(&self) -> Result<HashMap<DocumentKind, Vec<String>>, ConfigError> {
        let mut phrases = HashMap::new();
        let Some(table) = self
            .file
            .and_then(|f| f.get("requirement_phrases"))
            .and_then(|v| v.as_table())
        else {
            return Ok(phrases);
        };

        for kind in DocumentKind::ALL {
            let key = kind.label().replace(' ', "_");
            let Some(value) = table.get(&key) else {
                continue;
            };
            let list = value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(|s| s.to_string()))
                        .collect::<Vec<_>>()
                })
                .ok_or_else(|| ConfigError::EnvVarParseFailed {
                    var_name: format!("requirement_phrases.{}", key),
                    value: value.to_string(),
                    expected_type: "array of strings".to_string(),
                })?;
            phrases.insert(kind, list);
        }

        Ok(phrases)
    }
}

/// 解析布尔配置：true/false、yes/no、1/0（不区分大小写）
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}
