// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 职位列表的最大条目数
pub const MAX_JOBS: usize = 50;

/// 抓取协作者的返回结果
///
/// `Blocked` 表示遇到了验证码或反爬挑战页，并非异常
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// 正常提取到的数据
    Data(T),
    /// 被挑战页拦截，附带实际落地的地址
    Blocked { observed_url: String },
}

impl<T> Extraction<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Data(data) => Extraction::Data(f(data)),
            Extraction::Blocked { observed_url } => Extraction::Blocked { observed_url },
        }
    }
}

/// 个人主页
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experience: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<String>,
}

/// 公司主页
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headquarters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

/// 单条动态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// 页面上显示的原始时间（ISO 时间或相对时间，如 "3d"）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<u64>,
}

/// 动态列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsRecord {
    pub posts: Vec<PostItem>,
}

/// 单个职位
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listed_at: Option<String>,
}

/// 职位列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobsRecord {
    pub jobs: Vec<JobItem>,
}

impl JobsRecord {
    /// 截断到 [`MAX_JOBS`] 条
    pub fn capped(mut self) -> Self {
        self.jobs.truncate(MAX_JOBS);
        self
    }
}
