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

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::models::envelope::{BlockedPayload, ResultEnvelope, ScrapeRecord};
use crate::domain::models::records::Extraction;
use crate::domain::models::task::{QueueEntry, TaskDescriptor, TaskKind};
use crate::domain::services::lookback;
use crate::engines::traits::{ExtractOptions, ExtractionError, Extractor};
use crate::queue::throttle::Throttle;

/// 任务执行器
///
/// 逐个执行任务：先经过节流器，再调用抓取协作者，最后把结果包装成信封。
/// 任务之间严格串行，不做并行抓取。
pub struct TaskRunner {
    extractor: Arc<dyn Extractor>,
    throttle: Arc<Throttle>,
}

impl TaskRunner {
    /// 创建新的任务执行器
    ///
    /// # 参数
    ///
    /// * `extractor` - 抓取协作者
    /// * `throttle` - 共享节流器
    pub fn new(extractor: Arc<dyn Extractor>, throttle: Arc<Throttle>) -> Self {
        Self {
            extractor,
            throttle,
        }
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    /// 执行单个任务并返回结果 JSON
    ///
    /// 成功时返回 `ScrapeRecord`，遇到挑战页时返回挑战标记，
    /// 协作者的错误原样向上传递。单任务接口直接使用此方法。
    pub async fn execute(&self, descriptor: &TaskDescriptor) -> Result<Value, ExtractionError> {
        self.throttle.wait_turn().await;

        let options = ExtractOptions {
            use_session: descriptor.use_session(),
            lookback_days: descriptor.lookback_days(),
        };
        let url = descriptor.url();
        let extractor = &self.extractor;

        let extraction = match descriptor.kind() {
            TaskKind::Profile => to_json(extractor.profile(url, &options).await?)?,
            TaskKind::ProfilePosts => {
                let posts = extractor.profile_posts(url, &options).await?;
                to_json(posts.map(|mut record| {
                    record.posts =
                        lookback::filter_recent(record.posts, options.lookback_days, Utc::now());
                    record
                }))?
            }
            TaskKind::Company => to_json(extractor.company(url, &options).await?)?,
            TaskKind::CompanyPosts => {
                let posts = extractor.company_posts(url, &options).await?;
                to_json(posts.map(|mut record| {
                    record.posts =
                        lookback::filter_recent(record.posts, options.lookback_days, Utc::now());
                    record
                }))?
            }
            TaskKind::JobsCompany => {
                to_json(extractor.jobs_company(url, &options).await?.map(|r| r.capped()))?
            }
        };

        match extraction {
            Extraction::Data(data) => {
                let record = ScrapeRecord::new(url, data, Utc::now());
                serde_json::to_value(record).map_err(|e| ExtractionError::Parse(e.to_string()))
            }
            Extraction::Blocked { observed_url } => {
                warn!(
                    "{} task for {} hit a challenge page at {}",
                    descriptor.kind(),
                    url,
                    observed_url
                );
                serde_json::to_value(BlockedPayload::new(observed_url))
                    .map_err(|e| ExtractionError::Parse(e.to_string()))
            }
        }
    }

    /// 执行单个任务并包装成信封
    ///
    /// 不会向外抛出错误：协作者的任何失败都转换成 `ok:false` 的信封。
    #[instrument(skip(self, descriptor), fields(kind = %descriptor.kind(), url = %descriptor.url()))]
    pub async fn run_one(&self, descriptor: &TaskDescriptor) -> ResultEnvelope {
        let start = Instant::now();
        match self.execute(descriptor).await {
            Ok(result) => {
                debug!("Task finished in {} ms", start.elapsed().as_millis());
                ResultEnvelope::success(descriptor, result)
            }
            Err(e) => {
                error!("Task failed after {} ms: {}", start.elapsed().as_millis(), e);
                ResultEnvelope::failure(descriptor.kind().to_string(), descriptor.url(), e.to_string())
            }
        }
    }

    /// 执行一个队列条目
    ///
    /// 被拒绝的条目在本地生成失败信封，不经过节流器，也不调用协作者。
    pub async fn run_entry(&self, entry: &QueueEntry) -> ResultEnvelope {
        match entry {
            QueueEntry::Task(descriptor) => self.run_one(descriptor).await,
            QueueEntry::Rejected {
                type_name,
                url,
                reason,
            } => {
                warn!("Rejected queue entry type={} url={}: {}", type_name, url, reason);
                ResultEnvelope::failure(type_name.as_str(), url.as_str(), reason.to_string())
            }
        }
    }

    /// 按顺序执行全部条目，结束后一次性返回所有信封
    pub async fn run_many(&self, entries: &[QueueEntry]) -> Vec<ResultEnvelope> {
        info!("Running {} queued tasks", entries.len());
        let mut envelopes = Vec::with_capacity(entries.len());
        for entry in entries {
            envelopes.push(self.run_entry(entry).await);
        }
        envelopes
    }

    /// 按顺序执行全部条目，每个信封产生后立即发送
    ///
    /// 接收端关闭（客户端断开）不会中止剩余任务。返回执行的条目数。
    pub async fn run_streamed(
        &self,
        entries: Vec<QueueEntry>,
        sink: mpsc::Sender<ResultEnvelope>,
    ) -> usize {
        info!("Streaming {} queued tasks", entries.len());
        let mut receiver_gone = false;
        let total = entries.len();
        for entry in &entries {
            let envelope = self.run_entry(entry).await;
            if !receiver_gone && sink.send(envelope).await.is_err() {
                warn!("Stream receiver closed; remaining tasks will still run");
                receiver_gone = true;
            }
        }
        total
    }
}

fn to_json<T: Serialize>(extraction: Extraction<T>) -> Result<Extraction<Value>, ExtractionError> {
    match extraction {
        Extraction::Data(data) => serde_json::to_value(data)
            .map(Extraction::Data)
            .map_err(|e| ExtractionError::Parse(e.to_string())),
        Extraction::Blocked { observed_url } => Ok(Extraction::Blocked { observed_url }),
    }
}
