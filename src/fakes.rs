//! 内存中的招聘门户
//!
//! 实现 [`SessionGateway`] / [`PageElement`]，按脚本返回页面内容，
//! 并记录上传、提交和跳转，供流程层和编排层的测试使用。
//!
//! ```text
//! 登录页 ──SSO──> 账号页 ──proceed──> 二次验证页 / 门户首页
//! 列表页 ?page=N ──链接──> 职位详情页 ──Apply──> 申请弹窗
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{SessionError, SessionResult};
use crate::infrastructure::{selectors, ElementRef, Locator, PageElement, SessionGateway};

/// 门户根地址
pub const PORTAL_BASE: &str = "https://app.joinhandshake.com";
const SSO_LOGIN_URL: &str = "https://sso.example.edu/idp/login";
const SSO_MFA_URL: &str = "https://sso.example.edu/idp/mfa";

/// 职位详情页上的申请入口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    Internal,
    External,
    /// 两种按钮都没有
    Missing,
}

/// 申请弹窗中的一个表单项
#[derive(Debug, Clone)]
pub struct FakeField {
    pub label: String,
    /// 上传后是否出现完成标志
    pub confirms: bool,
}

/// 脚本化的职位详情页
#[derive(Debug, Clone)]
pub struct FakePosting {
    pub url: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub apply: ApplyMode,
    pub modal_text: String,
    pub fields: Vec<FakeField>,
    /// 详情页永远加载不完
    pub broken: bool,
}

impl FakePosting {
    pub fn new(job_id: &str) -> Self {
        Self {
            url: format!("{}/jobs/{}", PORTAL_BASE, job_id),
            title: Some(format!("Position {}", job_id)),
            company: Some(format!("Company {}", job_id)),
            apply: ApplyMode::Internal,
            modal_text: "Submit your application".to_string(),
            fields: Vec::new(),
            broken: false,
        }
    }

    /// 地址中不含职位 ID 的详情页
    pub fn without_job_id(slug: &str) -> Self {
        Self {
            url: format!("{}/employers/{}", PORTAL_BASE, slug),
            ..Self::new(slug)
        }
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    pub fn company(mut self, company: Option<&str>) -> Self {
        self.company = company.map(str::to_string);
        self
    }

    pub fn apply(mut self, mode: ApplyMode) -> Self {
        self.apply = mode;
        self
    }

    pub fn modal_text(mut self, text: &str) -> Self {
        self.modal_text = text.to_string();
        self
    }

    pub fn field(mut self, label: &str, confirms: bool) -> Self {
        self.fields.push(FakeField {
            label: label.to_string(),
            confirms,
        });
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// 一次上传记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub job_url: String,
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Blank,
    Login,
    Sso,
    SecondFactor,
    Home,
    Listing(usize),
    Posting(String),
}

#[derive(Debug)]
struct PortalState {
    username: String,
    password: String,
    second_factor_completes: bool,
    pages: Vec<Vec<FakePosting>>,
    pagination_present: bool,
    next_page_missing_on: Option<usize>,

    location: Location,
    typed_username: Option<String>,
    typed_password: Option<String>,
    modal_open: bool,
    uploaded_fields: HashSet<(String, usize)>,

    uploads: Vec<UploadRecord>,
    submitted: Vec<String>,
    navigations: Vec<String>,
}

impl PortalState {
    fn current_url(&self) -> String {
        match &self.location {
            Location::Blank => "about:blank".to_string(),
            Location::Login => login_url(),
            Location::Sso => SSO_LOGIN_URL.to_string(),
            Location::SecondFactor => SSO_MFA_URL.to_string(),
            Location::Home => format!("{}/explore", PORTAL_BASE),
            Location::Listing(index) => listing_url(*index),
            Location::Posting(url) => url.clone(),
        }
    }

    fn posting(&self, url: &str) -> Option<&FakePosting> {
        self.pages.iter().flatten().find(|p| p.url == url)
    }

    /// 当前页面上与定位匹配的元素
    fn lookup(&self, locator: &Locator) -> Vec<Node> {
        match &self.location {
            Location::Login if *locator == selectors::sso_button() => vec![Node::SsoButton],
            Location::Sso if *locator == selectors::username_field() => vec![Node::UsernameField],
            Location::Sso if *locator == selectors::password_field() => vec![Node::PasswordField],
            Location::Sso if *locator == selectors::login_proceed_button() => {
                vec![Node::ProceedButton]
            }
            Location::Listing(index) => self.lookup_listing(*index, locator),
            Location::Posting(url) => self.lookup_posting(url, locator),
            _ => Vec::new(),
        }
    }

    fn lookup_listing(&self, index: usize, locator: &Locator) -> Vec<Node> {
        let postings = self.pages.get(index).map(Vec::as_slice).unwrap_or_default();

        if *locator == selectors::last_page_button() && self.pagination_present {
            vec![Node::LastPage(self.pages.len())]
        } else if *locator == selectors::next_page_button()
            && index + 1 < self.pages.len()
            && self.next_page_missing_on != Some(index)
        {
            vec![Node::NextPage]
        } else if *locator == selectors::job_result_card() && !postings.is_empty() {
            vec![Node::Card]
        } else if *locator == selectors::job_result_link() {
            postings.iter().map(|p| Node::JobLink(p.url.clone())).collect()
        } else {
            Vec::new()
        }
    }

    fn lookup_posting(&self, url: &str, locator: &Locator) -> Vec<Node> {
        let Some(posting) = self.posting(url) else {
            return Vec::new();
        };
        if posting.broken {
            return Vec::new();
        }

        if *locator == selectors::share_button() {
            vec![Node::ShareButton]
        } else if *locator == selectors::employer_link() {
            posting.company.clone().map(Node::EmployerLink).into_iter().collect()
        } else if *locator == selectors::job_title() {
            posting.title.clone().map(Node::JobTitle).into_iter().collect()
        } else if *locator == selectors::apply_button()
            && posting.apply == ApplyMode::Internal
            && !self.modal_open
        {
            vec![Node::ApplyButton]
        } else if *locator == selectors::apply_externally_button()
            && posting.apply == ApplyMode::External
        {
            vec![Node::ExternalButton]
        } else if *locator == selectors::apply_modal() && self.modal_open {
            vec![Node::Modal(url.to_string())]
        } else if *locator == selectors::submit_application_button() && self.modal_open {
            vec![Node::SubmitButton(url.to_string())]
        } else {
            Vec::new()
        }
    }
}

/// 页面元素种类
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    SsoButton,
    UsernameField,
    PasswordField,
    ProceedButton,
    LastPage(usize),
    NextPage,
    Card,
    JobLink(String),
    ShareButton,
    EmployerLink(String),
    JobTitle(String),
    ApplyButton,
    ExternalButton,
    Modal(String),
    SubmitButton(String),
    Fieldset { job_url: String, index: usize },
    FileInput { job_url: String, index: usize },
    Checkmark,
}

/// 内存中的招聘门户
///
/// 克隆后共享同一份状态，可以一份交给被测代码，一份留在测试里检查。
#[derive(Debug, Clone)]
pub struct FakePortal {
    state: Arc<Mutex<PortalState>>,
}

impl Default for FakePortal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PortalState {
                username: "student".to_string(),
                password: "secret".to_string(),
                second_factor_completes: true,
                pages: Vec::new(),
                pagination_present: true,
                next_page_missing_on: None,
                location: Location::Blank,
                typed_username: None,
                typed_password: None,
                modal_open: false,
                uploaded_fields: HashSet::new(),
                uploads: Vec::new(),
                submitted: Vec::new(),
                navigations: Vec::new(),
            })),
        }
    }

    /// 追加一个列表页
    pub fn with_page(self, postings: Vec<FakePosting>) -> Self {
        self.lock().pages.push(postings);
        self
    }

    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.username = username.to_string();
            state.password = password.to_string();
        }
        self
    }

    /// 操作员是否会完成二次验证
    pub fn second_factor_completes(self, completes: bool) -> Self {
        self.lock().second_factor_completes = completes;
        self
    }

    pub fn without_pagination(self) -> Self {
        self.lock().pagination_present = false;
        self
    }

    /// 指定列表页上没有"下一页"按钮
    pub fn next_page_missing_on(self, page_index: usize) -> Self {
        self.lock().next_page_missing_on = Some(page_index);
        self
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.lock().uploads.clone()
    }

    /// 点击过提交按钮的职位地址
    pub fn submitted(&self) -> Vec<String> {
        self.lock().submitted.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn element(&self, node: Node) -> ElementRef {
        Box::new(FakeElement {
            state: Arc::clone(&self.state),
            node,
        })
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> SessionResult<ElementRef> {
        let node = self.lock().lookup(locator).into_iter().next();
        node.map(|node| self.element(node))
            .ok_or_else(|| SessionError::ElementNotFound {
                locator: locator.to_string(),
                timeout_ms: timeout.as_millis(),
            })
    }
}

/// 门户登录页
pub fn login_url() -> String {
    format!("{}/login", PORTAL_BASE)
}

/// 第 `index` 个列表页（从 0 开始）
pub fn listing_url(index: usize) -> String {
    format!("{}/job-search?page={}", PORTAL_BASE, index + 1)
}

#[async_trait]
impl SessionGateway for FakePortal {
    async fn navigate(&self, url: &str) -> SessionResult<()> {
        let mut state = self.lock();
        state.navigations.push(url.to_string());
        state.modal_open = false;

        let listing_prefix = format!("{}/job-search", PORTAL_BASE);
        let location = if url == login_url() {
            Location::Login
        } else if let Some(rest) = url.strip_prefix(&listing_prefix) {
            let page = rest
                .split("page=")
                .nth(1)
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(1);
            Location::Listing(page.saturating_sub(1))
        } else if state.posting(url).is_some() {
            Location::Posting(url.to_string())
        } else {
            return Err(SessionError::Protocol(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            )));
        };
        state.location = location;
        Ok(())
    }

    async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<ElementRef> {
        self.wait_for(locator, timeout)
    }

    async fn wait_for_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> SessionResult<ElementRef> {
        self.wait_for(locator, timeout)
    }

    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>> {
        let nodes = self.lock().lookup(locator);
        Ok(nodes.into_iter().map(|node| self.element(node)).collect())
    }

    async fn current_url(&self) -> SessionResult<String> {
        Ok(self.lock().current_url())
    }
}

struct FakeElement {
    state: Arc<Mutex<PortalState>>,
    node: Node,
}

impl FakeElement {
    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn child(&self, node: Node) -> ElementRef {
        Box::new(FakeElement {
            state: Arc::clone(&self.state),
            node,
        })
    }

    fn unsupported(&self, what: &str) -> SessionError {
        SessionError::Protocol(format!("{} not supported on {:?}", what, self.node))
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn click(&self) -> SessionResult<()> {
        let mut state = self.lock();
        match &self.node {
            Node::SsoButton => state.location = Location::Sso,
            Node::ProceedButton => {
                let accepted = state.typed_username.as_deref() == Some(state.username.as_str())
                    && state.typed_password.as_deref() == Some(state.password.as_str());
                if accepted {
                    state.location = if state.second_factor_completes {
                        Location::Home
                    } else {
                        Location::SecondFactor
                    };
                }
            }
            Node::NextPage => {
                if let Location::Listing(index) = state.location {
                    state.location = Location::Listing(index + 1);
                }
            }
            Node::ApplyButton => state.modal_open = true,
            Node::SubmitButton(url) => {
                let url = url.clone();
                state.submitted.push(url);
                state.modal_open = false;
            }
            _ => {}
        }
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> SessionResult<()> {
        let mut state = self.lock();
        match self.node {
            Node::UsernameField => state.typed_username = Some(text.to_string()),
            Node::PasswordField => state.typed_password = Some(text.to_string()),
            _ => return Err(self.unsupported("typing")),
        }
        Ok(())
    }

    async fn upload_file(&self, path: &Path) -> SessionResult<()> {
        let Node::FileInput { job_url, index } = &self.node else {
            return Err(self.unsupported("file upload"));
        };
        let mut state = self.lock();
        let label = state
            .posting(job_url)
            .and_then(|p| p.fields.get(*index))
            .map(|f| f.label.clone())
            .unwrap_or_default();
        state.uploads.push(UploadRecord {
            job_url: job_url.clone(),
            label,
            path: path.to_path_buf(),
        });
        state.uploaded_fields.insert((job_url.clone(), *index));
        Ok(())
    }

    async fn attribute(&self, name: &str) -> SessionResult<Option<String>> {
        let value = match (&self.node, name) {
            (Node::LastPage(total), "value") => Some(total.to_string()),
            (Node::JobLink(url), "href") => Some(url.clone()),
            (Node::EmployerLink(company), "aria-label") => Some(company.clone()),
            _ => None,
        };
        Ok(value)
    }

    async fn text(&self) -> SessionResult<String> {
        let state = self.lock();
        let text = match &self.node {
            Node::JobTitle(title) => title.clone(),
            Node::Modal(url) => match state.posting(url) {
                Some(posting) => {
                    let mut lines = vec![posting.modal_text.clone()];
                    lines.extend(posting.fields.iter().map(|f| f.label.clone()));
                    lines.join("\n")
                }
                None => String::new(),
            },
            Node::Fieldset { job_url, index } => state
                .posting(job_url)
                .and_then(|p| p.fields.get(*index))
                .map(|f| f.label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn find_all(&self, locator: &Locator) -> SessionResult<Vec<ElementRef>> {
        if let Locator::XPath(_) = locator {
            return Err(SessionError::UnsupportedLocator(locator.to_string()));
        }

        let state = self.lock();
        let nodes = match &self.node {
            Node::Modal(url) if *locator == selectors::modal_fieldset() => state
                .posting(url)
                .map(|p| {
                    (0..p.fields.len())
                        .map(|index| Node::Fieldset {
                            job_url: url.clone(),
                            index,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Node::Fieldset { job_url, index } if *locator == selectors::file_input() => {
                vec![Node::FileInput {
                    job_url: job_url.clone(),
                    index: *index,
                }]
            }
            Node::Fieldset { job_url, index } if *locator == selectors::upload_checkmark() => {
                let confirms = state
                    .posting(job_url)
                    .and_then(|p| p.fields.get(*index))
                    .is_some_and(|f| f.confirms);
                if confirms && state.uploaded_fields.contains(&(job_url.clone(), *index)) {
                    vec![Node::Checkmark]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        };
        drop(state);

        Ok(nodes.into_iter().map(|node| self.child(node)).collect())
    }
}
