// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::presentation::handlers::{queue_handler, scrape_handler};

/// 创建应用路由
///
/// 任务执行器通过 `Extension` 层注入
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let scrape_routes = Router::new()
        .route("/profile", get(scrape_handler::profile))
        .route("/profile_posts", get(scrape_handler::profile_posts))
        .route("/company", get(scrape_handler::company))
        .route("/company_posts", get(scrape_handler::company_posts))
        .route("/jobs_company", get(scrape_handler::jobs_company))
        .route("/queue", post(queue_handler::run_queue));

    Router::new()
        .merge(public_routes)
        .merge(scrape_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
