// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 会话存储错误类型
#[derive(Error, Debug)]
pub enum SessionStoreError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// 持久化的单个 Cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

/// 会话数据
///
/// 一组认证 Cookie，最后一次写入生效，不建模过期
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBlob {
    pub cookies: Vec<StoredCookie>,
    pub saved_at: DateTime<Utc>,
}

impl SessionBlob {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies,
            saved_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// 会话存储特质
///
/// 按字符串标识保存和恢复会话数据，跨进程重启保留
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 读取会话，不存在时返回 `None`
    async fn load(&self, key: &str) -> Result<Option<SessionBlob>, SessionStoreError>;

    /// 覆盖写入会话
    async fn save(&self, key: &str, blob: &SessionBlob) -> Result<(), SessionStoreError>;
}
