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

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::records::{
    CompanyRecord, Extraction, JobsRecord, PostsRecord, ProfileRecord,
};
use crate::domain::models::task::DEFAULT_LOOKBACK_DAYS;
use crate::domain::repositories::session_repository::SessionStoreError;

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// 浏览器启动或 CDP 调用失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 超时
    #[error("Navigation timed out after {0} seconds")]
    Timeout(u64),
    /// 需要登录但没有可用会话，也没有配置凭据
    #[error("Login required but no session or credentials are available")]
    LoginRequired,
    /// 交互式登录失败
    #[error("Login failed: {0}")]
    LoginFailed(String),
    /// 会话存储失败
    #[error("Session store error: {0}")]
    Session(#[from] SessionStoreError),
    /// 页面解析失败
    #[error("Parse error: {0}")]
    Parse(String),
}

/// 抓取选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// 是否走登录流程
    pub use_session: bool,
    /// 回溯天数，仅对动态类操作有意义
    pub lookback_days: i64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            use_session: false,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// 抓取协作者特质
///
/// 每种任务类型一个操作。遇到挑战页时返回 [`Extraction::Blocked`]，而不是错误。
#[async_trait]
pub trait Extractor: Send + Sync {
    /// 个人主页
    async fn profile(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<ProfileRecord>, ExtractionError>;

    /// 个人动态
    async fn profile_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError>;

    /// 公司主页
    async fn company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<CompanyRecord>, ExtractionError>;

    /// 公司动态
    async fn company_posts(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<PostsRecord>, ExtractionError>;

    /// 公司职位列表
    async fn jobs_company(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<Extraction<JobsRecord>, ExtractionError>;

    /// 协作者名称
    fn name(&self) -> &'static str;
}
