use std::fmt;
use std::path::PathBuf;

use crate::models::DocumentKind;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 页面或元素在限定时间内不可用
    Navigation(NavigationError),
    /// 策略要求的附件在磁盘上不存在
    MissingDocument(MissingDocumentError),
    /// 申请记录写入失败
    Persistence(PersistenceError),
    /// 登录流程无法完成
    Authentication(AuthenticationError),
    /// 配置错误
    Config(ConfigError),
    /// 浏览器启动/连接错误
    Browser(BrowserError),
    /// LLM 服务错误
    Llm(LlmError),
}

impl AppError {
    /// 是否应终止整个运行
    ///
    /// 单个职位的失败（导航、缺少附件）只影响当前职位；
    /// 申请记录写入失败、登录失败和配置错误会终止整个运行。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Persistence(_) | AppError::Authentication(_) | AppError::Config(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Navigation(e) => write!(f, "navigation error: {}", e),
            AppError::MissingDocument(e) => write!(f, "{}", e),
            AppError::Persistence(e) => write!(f, "persistence error: {}", e),
            AppError::Authentication(e) => write!(f, "authentication error: {}", e),
            AppError::Config(e) => write!(f, "configuration error: {}", e),
            AppError::Browser(e) => write!(f, "browser error: {}", e),
            AppError::Llm(e) => write!(f, "llm error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Navigation(e) => Some(e),
            AppError::MissingDocument(e) => Some(e),
            AppError::Persistence(e) => Some(e),
            AppError::Authentication(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Browser(e) => Some(e),
            AppError::Llm(e) => Some(e),
        }
    }
}

/// 导航错误
#[derive(Debug)]
pub enum NavigationError {
    /// 等待元素超时
    ElementNotFound { what: String, source: SessionError },
    /// 页面跳转失败
    PageLoadFailed { url: String, source: SessionError },
    /// 会话操作失败（点击、输入等）
    ActionFailed { action: String, source: SessionError },
    /// 页面内容无法解析
    Unparseable { what: String, value: String },
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::ElementNotFound { what, source } => {
                write!(f, "{} not found: {}", what, source)
            }
            NavigationError::PageLoadFailed { url, source } => {
                write!(f, "failed to load {}: {}", url, source)
            }
            NavigationError::ActionFailed { action, source } => {
                write!(f, "{} failed: {}", action, source)
            }
            NavigationError::Unparseable { what, value } => {
                write!(f, "could not parse {} from '{}'", what, value)
            }
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigationError::ElementNotFound { source, .. }
            | NavigationError::PageLoadFailed { source, .. }
            | NavigationError::ActionFailed { source, .. } => Some(source),
            NavigationError::Unparseable { .. } => None,
        }
    }
}

/// 缺少必需附件
#[derive(Debug)]
pub struct MissingDocumentError {
    pub kind: DocumentKind,
    pub path: PathBuf,
}

impl fmt::Display for MissingDocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "missing document: {} file not found at {}",
            self.kind.label(),
            self.path.display()
        )
    }
}

impl std::error::Error for MissingDocumentError {}

/// 申请记录写入错误
#[derive(Debug)]
pub enum PersistenceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io { path, source } => {
                write!(f, "cannot write ledger {}: {}", path.display(), source)
            }
            PersistenceError::Csv { path, source } => {
                write!(f, "cannot write ledger row to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io { source, .. } => Some(source),
            PersistenceError::Csv { source, .. } => Some(source),
        }
    }
}

/// 登录错误
#[derive(Debug)]
pub enum AuthenticationError {
    /// 登录步骤失败
    StepFailed { step: String, source: SessionError },
    /// 二次验证未在限定时间内完成
    SecondFactorTimeout { domain: String, waited_secs: u64 },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticationError::StepFailed { step, source } => {
                write!(f, "login step '{}' failed: {}", step, source)
            }
            AuthenticationError::SecondFactorTimeout {
                domain,
                waited_secs,
            } => write!(
                f,
                "second factor not completed within {}s (never reached {})",
                waited_secs, domain
            ),
        }
    }
}

impl std::error::Error for AuthenticationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthenticationError::StepFailed { source, .. } => Some(source),
            AuthenticationError::SecondFactorTimeout { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必需的配置项不存在
    EnvVarNotFound { var_name: String },
    /// 配置文件无法读取或解析
    FileInvalid { path: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => write!(
                f,
                "{} = '{}' cannot be parsed as {}",
                var_name, value, expected_type
            ),
            ConfigError::EnvVarNotFound { var_name } => {
                write!(f, "required setting {} is missing", var_name)
            }
            ConfigError::FileInvalid { path, message } => {
                write!(f, "config file {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "cannot connect to browser on port {}: {}", port, source)
            }
            BrowserError::LaunchFailed { source } => write!(f, "cannot launch browser: {}", source),
            BrowserError::PageCreationFailed { source } => {
                write!(f, "cannot create page: {}", source)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. }
            | BrowserError::LaunchFailed { source }
            | BrowserError::PageCreationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// LLM 服务错误
#[derive(Debug)]
pub enum LlmError {
    /// API 调用失败
    ApiCallFailed {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    EmptyContent { model: String },
    /// 读取简历或写出求职信失败
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// 简历文件无法提取文本
    ResumeUnreadable { path: PathBuf, message: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ApiCallFailed { model, source } => {
                write!(f, "LLM call failed (model {}): {}", model, source)
            }
            LlmError::EmptyContent { model } => write!(f, "LLM returned no content (model {})", model),
            LlmError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            LlmError::ResumeUnreadable { path, message } => {
                write!(f, "cannot extract text from {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LlmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LlmError::ApiCallFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            LlmError::Io { source, .. } => Some(source),
            LlmError::EmptyContent { .. } | LlmError::ResumeUnreadable { .. } => None,
        }
    }
}

/// 会话网关底层错误
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("element {locator} not found within {timeout_ms}ms")]
    ElementNotFound { locator: String, timeout_ms: u128 },
    #[error("locator {0} is not supported at element scope")]
    UnsupportedLocator(String),
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

// ========== 从常见错误类型转换 ==========

impl From<NavigationError> for AppError {
    fn from(err: NavigationError) -> Self {
        AppError::Navigation(err)
    }
}

impl From<MissingDocumentError> for AppError {
    fn from(err: MissingDocumentError) -> Self {
        AppError::MissingDocument(err)
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Persistence(err)
    }
}

impl From<AuthenticationError> for AppError {
    fn from(err: AuthenticationError) -> Self {
        AppError::Authentication(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<BrowserError> for AppError {
    fn from(err: BrowserError) -> Self {
        AppError::Browser(err)
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err)
    }
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建元素未找到错误
    pub fn element_not_found(what: impl Into<String>, source: SessionError) -> Self {
        AppError::Navigation(NavigationError::ElementNotFound {
            what: what.into(),
            source,
        })
    }

    /// 创建会话操作失败错误
    pub fn action_failed(action: impl Into<String>, source: SessionError) -> Self {
        AppError::Navigation(NavigationError::ActionFailed {
            action: action.into(),
            source,
        })
    }

    /// 创建页面加载失败错误
    pub fn page_load_failed(url: impl Into<String>, source: SessionError) -> Self {
        AppError::Navigation(NavigationError::PageLoadFailed {
            url: url.into(),
            source,
        })
    }

    /// 创建登录步骤失败错误
    pub fn login_step_failed(step: impl Into<String>, source: SessionError) -> Self {
        AppError::Authentication(AuthenticationError::StepFailed {
            step: step.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 会话网关结果类型
pub type SessionResult<T> = Result<T, SessionError>;
