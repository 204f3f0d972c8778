// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::config::settings::Settings;
use crate::domain::models::records::{
    CompanyRecord, Extraction, JobsRecord, PostsRecord, ProfileRecord,
};
use crate::domain::repositories::session_repository::SessionStore;
use crate::engines::browser::{with_session, PageDriver, PageSnapshot};
use crate::engines::parsers;
use crate::engines::session::{Credentials, SessionManager};
use crate::engines::traits::{ExtractOptions, ExtractionError, Extractor};

const ACTIVITY_PATH: &str = "recent-activity/all/";
const COMPANY_POSTS_PATH: &str = "posts/";
const COMPANY_JOBS_PATH: &str = "jobs/";

/// 基于 Chromium 的抓取协作者
///
/// 每次调用启动一个独立的浏览器会话，调用结束后关闭
pub struct ChromiumExtractor {
    settings: Arc<Settings>,
    sessions: SessionManager,
}

impl ChromiumExtractor {
    pub fn new(settings: Arc<Settings>, store: Arc<dyn SessionStore>) -> Self {
        let sessions = SessionManager::new(
            store,
            settings.session.key.clone(),
            Credentials::from_settings(&settings.credentials),
            &settings.site,
        );
        Self { settings, sessions }
    }

    /// 启动浏览器、加载页面并关闭浏览器
    async fn fetch(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PageSnapshot>, ExtractionError> {
        let started = Instant::now();
        let sessions = &self.sessions;
        let use_session = options.use_session;
        let result = with_session(&self.settings.browser, |page| async move {
            load_page(&page, sessions, url, use_session).await
        })
        .await;

        match &result {
            Ok(Extraction::Data(_)) => {
                info!("Loaded {} in {:?}", url, started.elapsed())
            }
            Ok(Extraction::Blocked { observed_url }) => {
                warn!("Challenge page at {} while loading {}", observed_url, url)
            }
            Err(e) => warn!("Failed to load {}: {}", url, e),
        }
        result
    }
}

/// 加载页面并识别挑战页
///
/// 需要会话时交给 [`SessionManager`] 处理登录墙，否则直接导航
pub async fn load_page(
    driver: &dyn PageDriver,
    sessions: &SessionManager,
    url: &str,
    use_session: bool,
) -> Result<Extraction<PageSnapshot>, ExtractionError> {
    let snapshot = if use_session {
        sessions.open_authenticated(driver, url).await?
    } else {
        driver.navigate(url).await?
    };

    if parsers::detect_challenge(&snapshot.url, &snapshot.html) {
        return Ok(Extraction::Blocked {
            observed_url: snapshot.url,
        });
    }
    Ok(Extraction::Data(snapshot))
}

/// 在页面地址后追加子路径，例如 `/in/jane` 变为 `/in/jane/recent-activity/all/`
///
/// 地址已经以子路径结尾时保持不变，无法解析的地址原样返回
pub fn sub_page_url(url: &str, sub_path: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    parsed.set_query(None);
    parsed.set_fragment(None);

    let trimmed = sub_path.trim_end_matches('/');
    let path = parsed.path().trim_end_matches('/').to_string();
    if path.ends_with(&format!("/{}", trimmed)) {
        parsed.set_path(&format!("{}/", path));
    } else {
        parsed.set_path(&format!("{}/{}", path, sub_path));
    }
    parsed.to_string()
}

#[async_trait]
impl Extractor for ChromiumExtractor {
    async fn profile(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<ProfileRecord>, ExtractionError> {
        Ok(self
            .fetch(url, options)
            .await?
            .map(|page| parsers::parse_profile(&page.html)))
    }

    async fn profile_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        let target = sub_page_url(url, ACTIVITY_PATH);
        Ok(self
            .fetch(&target, options)
            .await?
            .map(|page| parsers::parse_posts(&page.html, &page.url)))
    }

    async fn company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<CompanyRecord>, ExtractionError> {
        Ok(self
            .fetch(url, options)
            .await?
            .map(|page| parsers::parse_company(&page.html)))
    }

    async fn company_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        let target = sub_page_url(url, COMPANY_POSTS_PATH);
        Ok(self
            .fetch(&target, options)
            .await?
            .map(|page| parsers::parse_posts(&page.html, &page.url)))
    }

    async fn jobs_company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<JobsRecord>, ExtractionError> {
        let target = sub_page_url(url, COMPANY_JOBS_PATH);
        Ok(self
            .fetch(&target, options)
            .await?
            .map(|page| parsers::parse_jobs(&page.html, &page.url)))
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
