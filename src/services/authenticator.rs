//! 登录服务 - 业务能力层
//!
//! 只负责"登录门户"能力：单点登录、填写账号、等待人工完成二次验证

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult, AuthenticationError};
use crate::infrastructure::{selectors, SessionGateway};

/// 二次验证期间检查地址的间隔
const MFA_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 登录服务
pub struct Authenticator {
    login_url: String,
    username: String,
    password: String,
    portal_domain: String,
    timeout: Duration,
    mfa_timeout: Duration,
    mfa_poll_interval: Duration,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            portal_domain: config.portal_domain.clone(),
            timeout: config.wait_timeout,
            mfa_timeout: config.mfa_timeout,
            mfa_poll_interval: MFA_POLL_INTERVAL.min(config.mfa_timeout),
        }
    }

    /// 完成整个登录流程
    ///
    /// 任何一步失败都返回 `AuthenticationError`
    pub async fn login(&self, gateway: &dyn SessionGateway) -> AppResult<()> {
        info!("🔐 正在登录门户...");

        gateway
            .navigate(&self.login_url)
            .await
            .map_err(|e| AppError::login_step_failed("open login page", e))?;

        let sso = gateway
            .wait_for_clickable(&selectors::sso_button(), self.timeout)
            .await
            .map_err(|e| AppError::login_step_failed("find SSO button", e))?;
        sso.click()
            .await
            .map_err(|e| AppError::login_step_failed("click SSO button", e))?;

        let username = gateway
            .wait_for_present(&selectors::username_field(), self.timeout)
            .await
            .map_err(|e| AppError::login_step_failed("find username field", e))?;
        username
            .send_keys(&self.username)
            .await
            .map_err(|e| AppError::login_step_failed("type username", e))?;

        let password = gateway
            .wait_for_present(&selectors::password_field(), self.timeout)
            .await
            .map_err(|e| AppError::login_step_failed("find password field", e))?;
        password
            .send_keys(&self.password)
            .await
            .map_err(|e| AppError::login_step_failed("type password", e))?;

        let proceed = gateway
            .wait_for_clickable(&selectors::login_proceed_button(), self.timeout)
            .await
            .map_err(|e| AppError::login_step_failed("find login button", e))?;
        proceed
            .click()
            .await
            .map_err(|e| AppError::login_step_failed("click login button", e))?;

        info!("⏳ 等待二次验证，请手动完成...");
        self.wait_for_portal(gateway).await?;

        info!("✅ 登录成功");
        Ok(())
    }

    /// 轮询当前地址，直到回到门户域名
    async fn wait_for_portal(&self, gateway: &dyn SessionGateway) -> AppResult<()> {
        let deadline = Instant::now() + self.mfa_timeout;
        loop {
            let url = gateway
                .current_url()
                .await
                .map_err(|e| AppError::login_step_failed("read current url", e))?;
            if url.contains(&self.portal_domain) {
                debug!("已回到门户: {}", url);
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AuthenticationError::SecondFactorTimeout {
                    domain: self.portal_domain.clone(),
                    waited_secs: self.mfa_timeout.as_secs(),
                }
                .into());
            }
            sleep(self.mfa_poll_interval).await;
        }
    }
}
