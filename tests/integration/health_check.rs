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
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

use crate::helpers::{app_with, body_json, body_string, get, UnreachableExtractor};

/// 健康检查测试
///
/// 验证健康检查端点不依赖抓取协作者
#[tokio::test]
async fn health_check_works() {
    let (app, _) = app_with(Arc::new(UnreachableExtractor));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));
}

#[tokio::test]
async fn version_reports_crate_version() {
    let (app, _) = app_with(Arc::new(UnreachableExtractor));

    let response = app.oneshot(get("/version")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, env!("CARGO_PKG_VERSION"));
}
