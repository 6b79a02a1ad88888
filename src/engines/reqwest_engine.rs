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

use crate::config::settings::ScraperSettings;
use crate::engines::traits::{EngineError, FetchOutcome, Page, PageFetcher};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error};
use url::Url;

/// 抓取引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 同时进行的最大请求数
    pub max_concurrent_requests: usize,
    /// 单次请求超时时间
    pub timeout: Duration,
    /// User-Agent
    pub user_agent: String,
}

impl From<&ScraperSettings> for EngineConfig {
    fn from(settings: &ScraperSettings) -> Self {
        Self {
            max_concurrent_requests: settings.max_concurrent_requests,
            timeout: Duration::from_secs(settings.request_timeout_secs),
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// 抓取引擎
///
/// 基于reqwest实现的HTTP页面获取引擎。所有调用方共享一个固定许可数的信号量，
/// 每次请求前获取一个许可，请求结束（成功、超时或传输错误）后释放。
pub struct ReqwestEngine {
    client: reqwest::Client,
    gate: Arc<Semaphore>,
}

impl ReqwestEngine {
    /// 创建新的抓取引擎
    ///
    /// # 参数
    ///
    /// * `config` - 引擎配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 抓取引擎实例
    /// * `Err(EngineError)` - HTTP客户端构建失败
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            gate: Arc::new(Semaphore::new(config.max_concurrent_requests)),
        })
    }

    /// 当前空闲的并发许可数
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// 在并发闸门内执行请求
    ///
    /// # 返回值
    ///
    /// * `Ok(Page)` - 成功获取的页面
    /// * `Err(EngineError)` - 请求过程中出现的错误
    pub async fn try_fetch(&self, url: &Url) -> Result<Page, EngineError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| EngineError::GateClosed)?;

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(classify)?;

        debug!(
            url = %url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched page"
        );

        Ok(Page {
            url: final_url,
            html,
        })
    }
}

fn classify(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        EngineError::Timeout
    } else {
        EngineError::RequestFailed(err)
    }
}

#[async_trait]
impl PageFetcher for ReqwestEngine {
    /// 获取页面
    ///
    /// 任何错误都会被记录并归一化为 `FetchOutcome::NoContent`
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        match self.try_fetch(url).await {
            Ok(page) => {
                metrics::counter!("catalogrs_pages_fetched_total").increment(1);
                FetchOutcome::Page(page)
            }
            Err(e) => {
                metrics::counter!("catalogrs_fetch_failures_total").increment(1);
                error!(url = %url, error = %e, "Failed to fetch page");
                FetchOutcome::NoContent
            }
        }
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
