// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use scrapegate::config::settings::SiteSettings;
use scrapegate::domain::repositories::session_repository::{SessionStore, StoredCookie};
use scrapegate::engines::browser::{PageDriver, PageSnapshot};
use scrapegate::engines::session::{Credentials, SessionManager};
use scrapegate::engines::traits::ExtractionError;
use scrapegate::infrastructure::storage::FileSessionStore;
use std::sync::{Arc, Mutex};

const PROFILE_URL: &str = "https://example.com/in/jane";

/// 模拟站点：没有 li_at Cookie 时任何页面都跳转到登录墙
#[derive(Default)]
struct FakeSite {
    cookies: Mutex<Vec<StoredCookie>>,
    logins: Mutex<u32>,
}

impl FakeSite {
    fn signed_in(&self) -> bool {
        self.cookies.lock().unwrap().iter().any(|c| c.name == "li_at")
    }

    fn page(url: &str, html: &str) -> PageSnapshot {
        PageSnapshot {
            url: url.to_string(),
            html: html.to_string(),
        }
    }
}

#[async_trait]
impl PageDriver for FakeSite {
    async fn navigate(&self, url: &str) -> Result<PageSnapshot, ExtractionError> {
        if url.ends_with("/login") {
            return Ok(Self::page(url, "<form class=\"login__form\"></form>"));
        }
        if self.signed_in() {
            Ok(Self::page(url, "<h1>Jane Doe</h1>"))
        } else {
            Ok(Self::page("https://example.com/authwall?trk=x", "<html></html>"))
        }
    }

    async fn fill(&self, _selector: &str, _text: &str) -> Result<(), ExtractionError> {
        Ok(())
    }

    async fn submit(&self, _selector: &str) -> Result<PageSnapshot, ExtractionError> {
        *self.logins.lock().unwrap() += 1;
        self.cookies.lock().unwrap().push(StoredCookie {
            name: "li_at".to_string(),
            value: "token".to_string(),
            domain: ".example.com".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
        });
        Ok(Self::page("https://example.com/feed/", "<h1>Feed</h1>"))
    }

    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<(), ExtractionError> {
        self.cookies.lock().unwrap().extend_from_slice(cookies);
        Ok(())
    }

    async fn export_cookies(&self) -> Result<Vec<StoredCookie>, ExtractionError> {
        Ok(self.cookies.lock().unwrap().clone())
    }
}

fn site() -> SiteSettings {
    SiteSettings {
        base_url: "https://example.com".to_string(),
        login_path: "/login".to_string(),
    }
}

#[tokio::test]
async fn login_once_then_reuse_stored_session() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(dir.path()));

    let first_browser = FakeSite::default();
    let manager = SessionManager::new(
        store.clone(),
        "jane",
        Some(Credentials::new("jane@example.com", "hunter2")),
        &site(),
    );
    let snapshot = manager
        .open_authenticated(&first_browser, PROFILE_URL)
        .await
        .unwrap();
    assert_eq!(snapshot.url, PROFILE_URL);
    assert_eq!(*first_browser.logins.lock().unwrap(), 1);
    assert!(dir.path().join("jane.session.json").exists());

    // A fresh browser with no credentials relies on the saved cookies.
    let second_browser = FakeSite::default();
    let manager = SessionManager::new(store.clone(), "jane", None, &site());
    let snapshot = manager
        .open_authenticated(&second_browser, PROFILE_URL)
        .await
        .unwrap();
    assert_eq!(snapshot.html, "<h1>Jane Doe</h1>");
    assert_eq!(*second_browser.logins.lock().unwrap(), 0);
}

#[tokio::test]
async fn login_wall_without_credentials_or_session_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(dir.path()));
    let manager = SessionManager::new(store, "nobody", None, &site());

    let result = manager
        .open_authenticated(&FakeSite::default(), PROFILE_URL)
        .await;

    assert!(matches!(result, Err(ExtractionError::LoginRequired)));
}

#[tokio::test]
async fn corrupt_session_file_falls_back_to_login() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("jane.session.json"), "{not json").unwrap();
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(dir.path()));
    let manager = SessionManager::new(
        store.clone(),
        "jane",
        Some(Credentials::new("jane@example.com", "hunter2")),
        &site(),
    );
    let browser = FakeSite::default();

    let snapshot = manager
        .open_authenticated(&browser, PROFILE_URL)
        .await
        .unwrap();

    assert_eq!(snapshot.url, PROFILE_URL);
    assert_eq!(*browser.logins.lock().unwrap(), 1);
    let rewritten = store.load("jane").await.unwrap().unwrap();
    assert_eq!(rewritten.cookies.len(), 1);
    assert_eq!(rewritten.cookies[0].name, "li_at");
}
