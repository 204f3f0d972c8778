// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Extension, Router,
};
use scrapegate::domain::models::records::{
    CompanyRecord, Extraction, JobsRecord, PostItem, PostsRecord, ProfileRecord,
};
use scrapegate::engines::traits::{ExtractOptions, ExtractionError, Extractor};
use scrapegate::presentation::routes;
use scrapegate::queue::task_runner::TaskRunner;
use scrapegate::queue::throttle::Throttle;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 固定返回数据的抓取协作者，记录每次调用
#[derive(Default)]
pub struct StubExtractor {
    pub calls: Mutex<Vec<(String, String, ExtractOptions)>>,
    pub posts: Vec<PostItem>,
    pub blocked_at: Option<String>,
    pub fail_with: Option<String>,
    pub login_required: bool,
}

impl StubExtractor {
    pub fn with_posts(posts: Vec<PostItem>) -> Self {
        Self {
            posts,
            ..Default::default()
        }
    }

    pub fn blocked(observed_url: &str) -> Self {
        Self {
            blocked_at: Some(observed_url.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn requiring_login() -> Self {
        Self {
            login_required: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, String, ExtractOptions)> {
        self.calls.lock().unwrap().clone()
    }

    fn record<T>(
        &self,
        op: &str,
        url: &str,
        options: &ExtractOptions,
        data: T,
    ) -> Result<Extraction<T>, ExtractionError> {
        self.calls
            .lock()
            .unwrap()
            .push((op.to_string(), url.to_string(), *options));
        if self.login_required {
            return Err(ExtractionError::LoginRequired);
        }
        if let Some(message) = &self.fail_with {
            return Err(ExtractionError::Navigation(message.clone()));
        }
        if let Some(observed_url) = &self.blocked_at {
            return Ok(Extraction::Blocked {
                observed_url: observed_url.clone(),
            });
        }
        Ok(Extraction::Data(data))
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn profile(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<ProfileRecord>, ExtractionError> {
        let record = ProfileRecord {
            name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        self.record("profile", url, options, record)
    }

    async fn profile_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        let record = PostsRecord {
            posts: self.posts.clone(),
        };
        self.record("profile_posts", url, options, record)
    }

    async fn company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<CompanyRecord>, ExtractionError> {
        let record = CompanyRecord {
            name: Some("Acme".to_string()),
            ..Default::default()
        };
        self.record("company", url, options, record)
    }

    async fn company_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        let record = PostsRecord {
            posts: self.posts.clone(),
        };
        self.record("company_posts", url, options, record)
    }

    async fn jobs_company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<JobsRecord>, ExtractionError> {
        self.record("jobs_company", url, options, JobsRecord::default())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// 任何调用都会 panic 的协作者，用于验证请求在抓取前被拒绝
pub struct UnreachableExtractor;

#[async_trait]
impl Extractor for UnreachableExtractor {
    async fn profile(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<ProfileRecord>, ExtractionError> {
        panic!("profile called for {}", url)
    }

    async fn profile_posts(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        panic!("profile_posts called for {}", url)
    }

    async fn company(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<CompanyRecord>, ExtractionError> {
        panic!("company called for {}", url)
    }

    async fn company_posts(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        panic!("company_posts called for {}", url)
    }

    async fn jobs_company(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<JobsRecord>, ExtractionError> {
        panic!("jobs_company called for {}", url)
    }

    fn name(&self) -> &'static str {
        "unreachable"
    }
}

/// 第二次及之后的 company 调用会等到 `gate` 放行
#[derive(Default)]
pub struct GatedExtractor {
    pub gate: Notify,
    calls: AtomicUsize,
}

impl GatedExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for GatedExtractor {
    async fn profile(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<ProfileRecord>, ExtractionError> {
        panic!("profile called for {}", url)
    }

    async fn profile_posts(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        panic!("profile_posts called for {}", url)
    }

    async fn company(
        &self,
        _url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<CompanyRecord>, ExtractionError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            self.gate.notified().await;
        }
        Ok(Extraction::Data(CompanyRecord {
            name: Some("Acme".to_string()),
            ..Default::default()
        }))
    }

    async fn company_posts(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError> {
        panic!("company_posts called for {}", url)
    }

    async fn jobs_company(
        &self,
        url: &str,
        _options: &ExtractOptions,
    ) -> Result<Extraction<JobsRecord>, ExtractionError> {
        panic!("jobs_company called for {}", url)
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// 使用零间隔节流器构建应用
pub fn app_with(extractor: Arc<dyn Extractor>) -> (Router, Arc<TaskRunner>) {
    let runner = Arc::new(TaskRunner::new(extractor, Arc::new(Throttle::new(0, 0))));
    let app = routes::routes().layer(Extension(runner.clone()));
    (app, runner)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
