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

use axum::Extension;
use scrapegate::config::settings::Settings;
use scrapegate::domain::repositories::session_repository::SessionStore;
use scrapegate::engines::chromium_extractor::ChromiumExtractor;
use scrapegate::engines::traits::Extractor;
use scrapegate::infrastructure::storage::FileSessionStore;
use scrapegate::presentation::routes;
use scrapegate::queue::task_runner::TaskRunner;
use scrapegate::queue::throttle::Throttle;
use scrapegate::utils::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting scrapegate...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");
    if settings.credentials.pair().is_none() {
        warn!("No login credentials configured; login=1 requests need a stored session");
    }

    // 3. Session store and extraction collaborator
    let session_store: Arc<dyn SessionStore> =
        Arc::new(FileSessionStore::from_settings(&settings.session));
    let extractor: Arc<dyn Extractor> =
        Arc::new(ChromiumExtractor::new(settings.clone(), session_store));
    info!("Extractor '{}' ready", extractor.name());

    // 4. Throttle and runner
    let throttle = Arc::new(Throttle::from_settings(&settings.throttle));
    let (min_ms, max_ms) = throttle.bounds();
    info!("Throttle between {} and {} ms", min_ms, max_ms);
    let runner = Arc::new(TaskRunner::new(extractor, throttle));

    // 5. Start HTTP server
    let app = routes::routes().layer(Extension(runner));

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
