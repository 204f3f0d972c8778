// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::settings::SessionSettings;
use crate::domain::repositories::session_repository::{
    SessionBlob, SessionStore, SessionStoreError,
};

/// 本地文件系统会话存储
///
/// 每个键对应目录下的一个 JSON 文件
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(&settings.dir)
    }

    fn get_full_path(&self, key: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.session.json", sanitize_key(key)))
    }
}

/// 只保留字母、数字、`-` 和 `_`，防止键逃逸出存储目录
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionBlob>, SessionStoreError> {
        let full_path = self.get_full_path(key);

        match fs::read(&full_path).await {
            Ok(data) => {
                let blob: SessionBlob = serde_json::from_slice(&data)?;
                debug!(
                    "Loaded session '{}' with {} cookies",
                    key,
                    blob.cookies.len()
                );
                Ok(Some(blob))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SessionStoreError::Io(e)),
        }
    }

    async fn save(&self, key: &str, blob: &SessionBlob) -> Result<(), SessionStoreError> {
        let full_path = self.get_full_path(key);

        // 确保目录存在
        if let Some(parent) = Path::new(&full_path).parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(blob)?;
        // Write to a sibling file first so a crash never leaves half a session behind.
        // Unique per write so concurrent saves on one key never share a temp file.
        let tmp_path = full_path.with_extension(format!("json.{}.tmp", Uuid::new_v4()));
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp_path, &full_path).await?;

        debug!("Saved session '{}' to {}", key, full_path.display());
        Ok(())
    }
}

/// 测试用的内存会话存储
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    data: Arc<RwLock<HashMap<String, SessionBlob>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionBlob>, SessionStoreError> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, blob: &SessionBlob) -> Result<(), SessionStoreError> {
        self.data
            .write()
            .await
            .insert(key.to_string(), blob.clone());
        Ok(())
    }
}
