// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::settings::{CredentialSettings, SiteSettings};
use crate::domain::repositories::session_repository::{SessionBlob, SessionStore};
use crate::engines::browser::{PageDriver, PageSnapshot};
use crate::engines::parsers;
use crate::engines::traits::ExtractionError;

const USERNAME_SELECTOR: &str = "#username";
const PASSWORD_SELECTOR: &str = "#password";
const SUBMIT_SELECTOR: &str = "button[type='submit']";

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// 遇到登录墙时的决策
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDecision {
    /// 已有会话足够，直接继续
    Proceed,
    /// 执行交互式登录并写回会话
    Login,
    /// 没有会话也没有凭据，任务失败
    Fail,
}

/// 根据导航结果决定下一步
pub fn decide(login_wall: bool, has_credentials: bool) -> LoginDecision {
    match (login_wall, has_credentials) {
        (false, _) => LoginDecision::Proceed,
        (true, true) => LoginDecision::Login,
        (true, false) => LoginDecision::Fail,
    }
}

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// 用户名和密码都存在时才返回凭据
    pub fn from_settings(settings: &CredentialSettings) -> Option<Self> {
        settings.pair().map(|(u, p)| Self::new(u, p))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 会话管理器
///
/// 负责恢复会话 Cookie、在需要时执行登录并写回会话存储
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    key: String,
    credentials: Option<Credentials>,
    login_url: String,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        key: impl Into<String>,
        credentials: Option<Credentials>,
        site: &SiteSettings,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            credentials,
            login_url: site.login_url(),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// 把存储中的会话导入页面
    ///
    /// 导入了非空会话时返回 `Authenticated`，是否真的有效要等导航后才能确定。
    /// 读取失败的会话按不存在处理
    pub async fn restore(&self, driver: &dyn PageDriver) -> Result<SessionState, ExtractionError> {
        let stored = match self.store.load(&self.key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable session '{}': {}", self.key, e);
                None
            }
        };

        match stored {
            Some(blob) if !blob.is_empty() => {
                driver.import_cookies(&blob.cookies).await?;
                debug!(
                    "Restored session '{}' ({} cookies)",
                    self.key,
                    blob.cookies.len()
                );
                Ok(SessionState::Authenticated)
            }
            _ => Ok(SessionState::Unauthenticated),
        }
    }

    /// 导航到目标地址，必要时登录后重新导航
    ///
    /// 挑战页直接返回给调用方处理。
    pub async fn open_authenticated(
        &self,
        driver: &dyn PageDriver,
        url: &str,
    ) -> Result<PageSnapshot, ExtractionError> {
        let restored = self.restore(driver).await?;
        let snapshot = driver.navigate(url).await?;

        if parsers::detect_challenge(&snapshot.url, &snapshot.html) {
            return Ok(snapshot);
        }

        let login_wall = parsers::detect_login_wall(&snapshot.url, &snapshot.html);
        match decide(login_wall, self.has_credentials()) {
            LoginDecision::Proceed => {
                if restored == SessionState::Authenticated {
                    debug!("Stored session accepted for {}", url);
                }
                Ok(snapshot)
            }
            LoginDecision::Fail => {
                warn!("Login wall at {} and no credentials configured", snapshot.url);
                Err(ExtractionError::LoginRequired)
            }
            LoginDecision::Login => {
                let after_login = self.login(driver).await?;
                if parsers::detect_challenge(&after_login.url, &after_login.html) {
                    return Ok(after_login);
                }

                let snapshot = driver.navigate(url).await?;
                if !parsers::detect_challenge(&snapshot.url, &snapshot.html)
                    && parsers::detect_login_wall(&snapshot.url, &snapshot.html)
                {
                    return Err(ExtractionError::LoginFailed(
                        "still on login wall after signing in".to_string(),
                    ));
                }
                Ok(snapshot)
            }
        }
    }

    /// 交互式登录
    ///
    /// 登录看起来成功（没有停留在登录页或挑战页）时导出 Cookie 并写回存储
    pub async fn login(&self, driver: &dyn PageDriver) -> Result<PageSnapshot, ExtractionError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ExtractionError::LoginRequired)?;

        info!("Signing in as {}", credentials.username);
        driver.navigate(&self.login_url).await?;
        driver.fill(USERNAME_SELECTOR, &credentials.username).await?;
        driver.fill(PASSWORD_SELECTOR, &credentials.password).await?;
        let landed = driver.submit(SUBMIT_SELECTOR).await?;

        if parsers::detect_challenge(&landed.url, &landed.html) {
            warn!("Login landed on a challenge page: {}", landed.url);
            return Ok(landed);
        }
        if parsers::detect_login_wall(&landed.url, &landed.html) {
            return Err(ExtractionError::LoginFailed(format!(
                "still on {} after submitting credentials",
                landed.url
            )));
        }

        let cookies = driver.export_cookies().await?;
        self.store.save(&self.key, &SessionBlob::new(cookies)).await?;
        info!("Session '{}' saved after login", self.key);
        Ok(landed)
    }
}
