// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::auth::Credentials as ProxyCredentials;
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::settings::BrowserSettings;
use crate::domain::repositories::session_repository::StoredCookie;
use crate::engines::traits::ExtractionError;

/// 页面快照：最终地址和 HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// 页面驱动特质
///
/// 抓取流程和登录流程只依赖这组操作，测试时可以替换成假实现
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到地址，等待加载和固定的稳定时间，返回快照
    async fn navigate(&self, url: &str) -> Result<PageSnapshot, ExtractionError>;

    /// 在输入框中输入文本
    async fn fill(&self, selector: &str, text: &str) -> Result<(), ExtractionError>;

    /// 点击提交按钮并等待页面跳转
    async fn submit(&self, selector: &str) -> Result<PageSnapshot, ExtractionError>;

    /// 导入 Cookie
    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<(), ExtractionError>;

    /// 导出当前 Cookie
    async fn export_cookies(&self) -> Result<Vec<StoredCookie>, ExtractionError>;
}

/// 浏览器页面
///
/// 基于 chromiumoxide 的 [`PageDriver`] 实现，克隆后指向同一个标签页
#[derive(Clone)]
pub struct BrowserPage {
    page: Page,
    navigation_timeout: Duration,
    settle: Duration,
}

impl BrowserPage {
    async fn snapshot(&self) -> Result<PageSnapshot, ExtractionError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ExtractionError::Browser(e.to_string()))?
            .unwrap_or_default();
        let html = self
            .page
            .content()
            .await
            .map_err(|e| ExtractionError::Browser(e.to_string()))?;
        Ok(PageSnapshot { url, html })
    }

    fn timeout_secs(&self) -> u64 {
        self.navigation_timeout.as_secs()
    }
}

#[async_trait]
impl PageDriver for BrowserPage {
    async fn navigate(&self, url: &str) -> Result<PageSnapshot, ExtractionError> {
        debug!("Navigating to {}", url);
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout_secs()))?
            .map_err(|e| ExtractionError::Navigation(e.to_string()))?;

        // Fixed settle delay before DOM inspection.
        tokio::time::sleep(self.settle).await;
        self.snapshot().await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), ExtractionError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| ExtractionError::Browser(format!("Element {} not found: {}", selector, e)))?
            .click()
            .await
            .map_err(|e| ExtractionError::Browser(format!("Focus on {} failed: {}", selector, e)))?
            .type_str(text)
            .await
            .map_err(|e| ExtractionError::Browser(format!("Typing into {} failed: {}", selector, e)))?;
        Ok(())
    }

    async fn submit(&self, selector: &str) -> Result<PageSnapshot, ExtractionError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| ExtractionError::Browser(format!("Element {} not found: {}", selector, e)))?
            .click()
            .await
            .map_err(|e| ExtractionError::Browser(format!("Click on {} failed: {}", selector, e)))?;

        tokio::time::timeout(self.navigation_timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout_secs()))?
            .map_err(|e| ExtractionError::Navigation(e.to_string()))?;

        tokio::time::sleep(self.settle).await;
        self.snapshot().await
    }

    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<(), ExtractionError> {
        if cookies.is_empty() {
            return Ok(());
        }
        let params: Vec<CookieParam> = cookies.iter().map(to_cookie_param).collect();
        self.page
            .set_cookies(params)
            .await
            .map_err(|e| ExtractionError::Browser(format!("Failed to restore cookies: {}", e)))?;
        Ok(())
    }

    async fn export_cookies(&self) -> Result<Vec<StoredCookie>, ExtractionError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| ExtractionError::Browser(format!("Failed to read cookies: {}", e)))?;
        Ok(cookies.iter().map(from_cookie).collect())
    }
}

fn to_cookie_param(cookie: &StoredCookie) -> CookieParam {
    let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
    param.domain = Some(cookie.domain.clone());
    param.path = Some(cookie.path.clone());
    param.secure = Some(cookie.secure);
    param.http_only = Some(cookie.http_only);
    param
}

fn from_cookie(cookie: &Cookie) -> StoredCookie {
    StoredCookie {
        name: cookie.name.clone(),
        value: cookie.value.clone(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        secure: cookie.secure,
        http_only: cookie.http_only,
    }
}

/// 浏览器会话
///
/// 每个任务独占一个浏览器进程。调用 [`BrowserSession::close`] 正常关闭；
/// 若因错误或 panic 提前退出，`Drop` 会中止事件处理任务并清理临时配置目录，
/// 浏览器子进程随 `Browser` 一起被回收。
pub struct BrowserSession {
    browser: Browser,
    page: BrowserPage,
    handler_task: JoinHandle<()>,
    profile_dir: PathBuf,
    closed: bool,
}

impl BrowserSession {
    /// 启动浏览器并打开一个空白页
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, ExtractionError> {
        let profile_dir = std::env::temp_dir().join(format!("scrapegate-{}", Uuid::new_v4()));
        let navigation_timeout = Duration::from_secs(settings.navigation_timeout_secs);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(navigation_timeout)
            .user_data_dir(&profile_dir)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");

        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some(user_agent) = &settings.user_agent {
            builder = builder.arg(format!("--user-agent={}", user_agent));
        }
        if let Some(proxy_url) = &settings.proxy.url {
            builder = builder.arg(format!("--proxy-server={}", proxy_url));
        }

        let config = builder.build().map_err(ExtractionError::Browser)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ExtractionError::Browser(format!("Failed to launch browser: {}", e)))?;

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser, settings).await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                handler_task.abort();
                remove_profile_dir(&profile_dir);
                return Err(e);
            }
        };

        info!("Browser session started");
        Ok(Self {
            browser,
            page: BrowserPage {
                page,
                navigation_timeout,
                settle: Duration::from_millis(settings.settle_ms),
            },
            handler_task,
            profile_dir,
            closed: false,
        })
    }

    /// 当前页面
    pub fn page(&self) -> &BrowserPage {
        &self.page
    }

    /// 关闭浏览器并等待进程退出
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler_task.abort();
        self.closed = true;
        remove_profile_dir(&self.profile_dir);
        info!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close; aborting handler");
            self.handler_task.abort();
            remove_profile_dir(&self.profile_dir);
        }
    }
}

/// 在一个独占的浏览器会话中执行 `work`
///
/// 无论 `work` 成功还是失败都会关闭浏览器；panic 时由 `Drop` 兜底清理。
pub async fn with_session<T, F, Fut>(
    settings: &BrowserSettings,
    work: F,
) -> Result<T, ExtractionError>
where
    F: FnOnce(BrowserPage) -> Fut,
    Fut: Future<Output = Result<T, ExtractionError>>,
{
    let session = BrowserSession::launch(settings).await?;
    let result = work(session.page().clone()).await;
    session.close().await;
    result
}

async fn open_page(browser: &Browser, settings: &BrowserSettings) -> Result<Page, ExtractionError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ExtractionError::Browser(e.to_string()))?;

    if let Some(user_agent) = &settings.user_agent {
        page.set_user_agent(user_agent.as_str())
            .await
            .map_err(|e| ExtractionError::Browser(e.to_string()))?;
    }

    if let (Some(username), Some(password)) = (&settings.proxy.username, &settings.proxy.password)
    {
        page.authenticate(ProxyCredentials {
            username: username.clone(),
            password: password.clone(),
        })
        .await
        .map_err(|e| ExtractionError::Browser(format!("Proxy authentication failed: {}", e)))?;
    }

    Ok(page)
}

fn remove_profile_dir(dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("Failed to remove browser profile {}: {}", dir.display(), e);
        }
    }
}
