// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::settings::ThrottleSettings;

/// 节流器
///
/// 进程内单槽闸门：保证任意两次抓取操作的开始时间至少间隔
/// `random(min_ms..=max_ms)` 毫秒。读取上次开始时间、等待、记录新时间
/// 这三步在同一把异步锁内完成，调用方按到达顺序依次通过。
pub struct Throttle {
    last_start: Mutex<Option<Instant>>,
    min_ms: u64,
    max_ms: u64,
}

impl Throttle {
    /// 创建新的节流器
    ///
    /// # 参数
    ///
    /// * `min_ms` - 最小间隔（毫秒）
    /// * `max_ms` - 最大间隔（毫秒），小于 `min_ms` 时两者互换
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (min_ms, max_ms) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            last_start: Mutex::new(None),
            min_ms,
            max_ms,
        }
    }

    pub fn from_settings(settings: &ThrottleSettings) -> Self {
        Self::new(settings.min_ms, settings.max_ms)
    }

    /// 等待轮到自己
    ///
    /// 返回本次记录的开始时间。该操作不会失败，只会延迟。
    pub async fn wait_turn(&self) -> Instant {
        let mut last_start = self.last_start.lock().await;

        if let Some(previous) = *last_start {
            let interval = self.pick_interval();
            let elapsed = previous.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!("Throttle: waiting {} ms before next operation", wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }

        let now = Instant::now();
        *last_start = Some(now);
        now
    }

    /// 最近一次记录的开始时间
    pub async fn last_start(&self) -> Option<Instant> {
        *self.last_start.lock().await
    }

    fn pick_interval(&self) -> Duration {
        Duration::from_millis(rand::random_range(self.min_ms..=self.max_ms))
    }

    pub fn bounds(&self) -> (u64, u64) {
        (self.min_ms, self.max_ms)
    }
}
