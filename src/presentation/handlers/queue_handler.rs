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
    body::Body,
    extract::{Extension, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::domain::models::envelope::ResultEnvelope;
use crate::domain::models::task::{QueueEntry, QueueRequestDto};
use crate::queue::task_runner::TaskRunner;

/// NDJSON 响应的内容类型
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

const STREAM_BUFFER: usize = 16;

/// 批量执行任务
///
/// `stream=true` 时每完成一个任务就写出一行 NDJSON；
/// 否则等全部任务结束后返回 `{"ok":true,"results":[...]}`。
pub async fn run_queue(
    Extension(runner): Extension<Arc<TaskRunner>>,
    Json(payload): Json<QueueRequestDto>,
) -> Response {
    let entries: Vec<QueueEntry> = payload
        .tasks
        .into_iter()
        .map(|task| task.into_entry())
        .collect();
    info!(
        "Queue request with {} tasks (stream={})",
        entries.len(),
        payload.stream
    );

    if payload.stream {
        stream_envelopes(runner, entries)
    } else {
        let results = runner.run_many(&entries).await;
        (
            StatusCode::OK,
            Json(json!({ "ok": true, "results": results })),
        )
            .into_response()
    }
}

fn stream_envelopes(runner: Arc<TaskRunner>, entries: Vec<QueueEntry>) -> Response {
    let (tx, rx) = mpsc::channel::<ResultEnvelope>(STREAM_BUFFER);

    // The runner keeps going after the client disconnects.
    tokio::spawn(async move {
        let total = runner.run_streamed(entries, tx).await;
        info!("Queue stream finished after {} tasks", total);
    });

    let lines = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            let envelope = rx.recv().await?;
            match envelope.to_ndjson_line() {
                Ok(line) => return Some((Ok::<_, Infallible>(line), rx)),
                Err(e) => error!("Failed to encode envelope: {}", e),
            }
        }
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}
