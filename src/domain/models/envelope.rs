// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::task::TaskDescriptor;

/// 反爬挑战页的错误标记
pub const CAPTCHA_MARKER: &str = "captcha_or_challenge";

/// 一次成功抓取的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRecord {
    /// 请求的目标地址
    pub url: String,
    /// 抓取完成时间（ISO-8601）
    pub scraped_at: String,
    /// 各任务类型自己的数据
    pub data: Value,
}

impl ScrapeRecord {
    pub fn new(url: impl Into<String>, data: Value, scraped_at: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            scraped_at: scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            data,
        }
    }
}

/// 挑战页标记
///
/// 保持旧有的返回形态：作为成功结果返回，调用方需要检查 `error` 字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedPayload {
    pub error: String,
    /// 实际落地的地址
    pub url: String,
}

impl BlockedPayload {
    pub fn new(observed_url: impl Into<String>) -> Self {
        Self {
            error: CAPTCHA_MARKER.to_string(),
            url: observed_url.into(),
        }
    }
}

/// 结果信封
///
/// 每个任务恰好产生一个，创建后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub ok: bool,
    /// 任务类型（未知类型时为请求中的原始字符串）
    #[serde(rename = "type")]
    pub task_type: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn success(descriptor: &TaskDescriptor, result: Value) -> Self {
        Self {
            ok: true,
            task_type: descriptor.kind().to_string(),
            url: descriptor.url().to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(
        task_type: impl Into<String>,
        url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            task_type: task_type.into(),
            url: url.into(),
            result: None,
            error: Some(error.into()),
        }
    }

    /// 编码为一行 NDJSON（含换行符）
    pub fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// 结果是否为挑战页标记
    pub fn is_blocked(&self) -> bool {
        self.result
            .as_ref()
            .and_then(|r| r.get("error"))
            .and_then(Value::as_str)
            == Some(CAPTCHA_MARKER)
    }
}
