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

use axum::{
    extract::{Extension, Query},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::task::{
    parse_login_flag, TaskDescriptor, TaskKind, DEFAULT_LOOKBACK_DAYS,
};
use crate::presentation::errors::{AppError, RequestError};
use crate::queue::task_runner::TaskRunner;

/// 单任务接口的查询参数
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeQuery {
    pub url: Option<String>,
    pub days: Option<String>,
    pub login: Option<String>,
}

impl ScrapeQuery {
    /// 构造任务描述，缺少 `url` 时返回 [`RequestError::MissingUrl`]
    pub fn into_descriptor(self, kind: TaskKind) -> Result<TaskDescriptor, RequestError> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| RequestError::MissingUrl(missing_url_message(kind).to_string()))?;

        let days = self
            .days
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_LOOKBACK_DAYS);
        let use_session = self.login.as_deref().is_some_and(parse_login_flag);

        Ok(TaskDescriptor::new(kind, url)
            .with_lookback_days(days)
            .with_session(use_session))
    }
}

fn missing_url_message(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::JobsCompany => "Missing ?url (company page)",
        _ => "Missing ?url",
    }
}

async fn scrape(
    kind: TaskKind,
    runner: Arc<TaskRunner>,
    query: ScrapeQuery,
) -> Result<Json<Value>, AppError> {
    let descriptor = query.into_descriptor(kind).inspect_err(|e| {
        warn!("Rejected {} request: {}", kind, e);
    })?;

    info!("Scrape request kind={} url={}", kind, descriptor.url());
    let result = runner.execute(&descriptor).await?;
    Ok(Json(result))
}

pub async fn profile(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Value>, AppError> {
    scrape(TaskKind::Profile, runner, query).await
}

pub async fn profile_posts(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Value>, AppError> {
    scrape(TaskKind::ProfilePosts, runner, query).await
}

pub async fn company(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Value>, AppError> {
    scrape(TaskKind::Company, runner, query).await
}

pub async fn company_posts(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Value>, AppError> {
    scrape(TaskKind::CompanyPosts, runner, query).await
}

pub async fn jobs_company(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<Value>, AppError> {
    scrape(TaskKind::JobsCompany, runner, query).await
}
