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

use anyhow::Context;
use catalogrs::config::settings::{Settings, StorageBackend};
use catalogrs::domain::repositories::book_repository::BookRepository;
use catalogrs::domain::services::book_scrape_service::{BookScrapeService, ScrapeConfig};
use catalogrs::domain::services::headline_service::HeadlineService;
use catalogrs::engines::reqwest_engine::{EngineConfig, ReqwestEngine};
use catalogrs::engines::traits::PageFetcher;
use catalogrs::infrastructure::cache::redis_client::RedisClient;
use catalogrs::infrastructure::repositories::book_repo_impl::RedisBookRepository;
use catalogrs::infrastructure::repositories::memory_book_repo::MemoryBookRepository;
use catalogrs::presentation::routes::{self, AppComponents};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use catalogrs::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting catalogrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    if settings.metrics.enabled {
        catalogrs::infrastructure::metrics::init_metrics(&settings.metrics.address)?;
    }

    // 3. Storage
    let repo: Arc<dyn BookRepository> = match settings.storage.backend {
        StorageBackend::Redis => {
            let redis_client = RedisClient::new(&settings.redis.url).await?;
            let repo = RedisBookRepository::new(Arc::new(redis_client));
            if !repo.ping().await {
                warn!(url = %settings.redis.url, "Redis is not reachable yet");
            }
            info!("Redis book repository initialized");
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            info!("In-memory book repository initialized");
            Arc::new(MemoryBookRepository::new())
        }
    };

    // 4. Fetch engines, one gate per target site
    let book_fetcher: Arc<dyn PageFetcher> =
        Arc::new(ReqwestEngine::new(EngineConfig::from(&settings.scraper))?);
    let headline_fetcher: Arc<dyn PageFetcher> = Arc::new(ReqwestEngine::new(EngineConfig {
        max_concurrent_requests: settings.headlines.max_concurrent_requests,
        timeout: Duration::from_secs(settings.scraper.request_timeout_secs),
        user_agent: settings.scraper.user_agent.clone(),
    })?);

    // 5. Services
    let scrape_config =
        ScrapeConfig::try_from(&settings.scraper).context("Invalid scraper base URL")?;
    let scraper = Arc::new(BookScrapeService::new(
        book_fetcher,
        repo.clone(),
        scrape_config,
    ));
    let headlines = Arc::new(
        HeadlineService::from_settings(headline_fetcher, &settings.headlines)
            .context("Invalid headlines URL")?,
    );

    // 6. Start HTTP server
    let app = routes::build_app(AppComponents {
        repo,
        scraper,
        headlines,
        settings: settings.clone(),
    })?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
