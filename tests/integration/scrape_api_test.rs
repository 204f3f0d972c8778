// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::http::StatusCode;
use chrono::{Duration, SecondsFormat, Utc};
use scrapegate::domain::models::records::PostItem;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

use crate::helpers::{app_with, body_json, get, StubExtractor, UnreachableExtractor};

fn post_at(text: &str, age: Duration) -> PostItem {
    PostItem {
        text: Some(text.to_string()),
        posted_at: Some((Utc::now() - age).to_rfc3339_opts(SecondsFormat::Secs, true)),
        ..Default::default()
    }
}

/// 缺少 url 时返回 400，且不触碰节流器和协作者
#[tokio::test]
async fn missing_url_returns_400_without_extraction() {
    let (app, runner) = app_with(Arc::new(UnreachableExtractor));

    for path in ["/profile", "/profile_posts", "/company", "/company_posts"] {
        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body_json(response).await, json!({ "error": "Missing ?url" }));
    }

    let response = app.oneshot(get("/jobs_company?url=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Missing ?url (company page)" })
    );

    assert!(runner.throttle().last_start().await.is_none());
}

#[tokio::test]
async fn company_returns_scrape_record() {
    let stub = Arc::new(StubExtractor::default());
    let (app, _) = app_with(stub.clone());

    let response = app
        .oneshot(get("/company?url=https://example.com/company/acme"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["url"], "https://example.com/company/acme");
    assert_eq!(body["data"], json!({ "name": "Acme" }));
    assert!(body["scrapedAt"].as_str().unwrap().ends_with('Z'));

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "company");
    assert!(!calls[0].2.use_session);
}

#[tokio::test]
async fn profile_posts_applies_lookback_and_login_flag() {
    let stub = Arc::new(StubExtractor::with_posts(vec![
        post_at("fresh", Duration::days(2)),
        post_at("stale", Duration::days(20)),
        PostItem {
            text: Some("undated".to_string()),
            ..Default::default()
        },
    ]));
    let (app, _) = app_with(stub.clone());

    let response = app
        .oneshot(get(
            "/profile_posts?url=https://example.com/in/jane&days=7&login=1",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let texts: Vec<&str> = body["data"]["posts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["fresh", "undated"]);

    let calls = stub.calls();
    assert!(calls[0].2.use_session);
    assert_eq!(calls[0].2.lookback_days, 7);
}

#[tokio::test]
async fn challenge_page_returns_marker() {
    let stub = Arc::new(StubExtractor::blocked(
        "https://example.com/checkpoint/challenge/abc",
    ));
    let (app, _) = app_with(stub);

    let response = app
        .oneshot(get("/profile?url=https://example.com/in/jane"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "captcha_or_challenge",
            "url": "https://example.com/checkpoint/challenge/abc"
        })
    );
}

#[tokio::test]
async fn extraction_failure_returns_500() {
    let stub = Arc::new(StubExtractor::failing("net::ERR_NAME_NOT_RESOLVED"));
    let (app, _) = app_with(stub);

    let response = app
        .oneshot(get("/company?url=https://nowhere.invalid/company/acme"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("net::ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn login_required_returns_500() {
    let stub = Arc::new(StubExtractor::requiring_login());
    let (app, _) = app_with(stub.clone());

    let response = app
        .oneshot(get("/profile?url=https://example.com/in/jane&login=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Login required but no session or credentials are available" })
    );
    assert!(stub.calls()[0].2.use_session);
}

#[tokio::test]
async fn huge_lookback_window_keeps_every_post() {
    let stub = Arc::new(StubExtractor::with_posts(vec![
        post_at("recent", Duration::days(1)),
        post_at("ancient", Duration::days(3650)),
    ]));
    let (app, _) = app_with(stub);

    let response = app
        .oneshot(get(
            "/profile_posts?url=https://example.com/in/jane&days=9000000000000000",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 2);
}
