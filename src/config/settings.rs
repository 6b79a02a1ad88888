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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

/// 默认浏览器标识
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// 应用程序配置设置
///
/// 包含服务器、Redis、存储、抓取器、头条、速率限制、CORS和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 图书抓取配置
    pub scraper: ScraperSettings,
    /// 新闻头条配置
    pub headlines: HeadlineSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 跨域配置
    pub cors: CorsSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Redis 哈希 + 集合索引
    Redis,
    /// 进程内存储，用于本地运行和测试
    Memory,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储后端 (redis, memory)
    pub backend: StorageBackend,
}

/// 图书抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperSettings {
    /// 目标站点根URL
    pub base_url: String,
    /// 单次运行接受的图书总数上限
    pub max_books: usize,
    /// 价格上限（严格大于该值的图书会被丢弃）
    pub price_limit: f64,
    /// 同时进行的最大请求数
    pub max_concurrent_requests: usize,
    /// 单次请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 同一分类内翻页间隔（毫秒）
    pub page_delay_ms: u64,
    /// 请求使用的User-Agent
    pub user_agent: String,
    /// 价格无法解析时是否丢弃图书
    pub reject_unparseable_price: bool,
}

/// 新闻头条配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlineSettings {
    /// 头条站点URL
    pub url: String,
    /// 抓取页数
    pub pages: u32,
    /// 同时进行的最大请求数
    pub max_concurrent_requests: usize,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 每秒允许的请求数
    pub requests_per_second: u32,
    /// 突发容量
    pub burst: u32,
}

/// 跨域配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// 允许的来源，"*" 表示任意来源
    pub allowed_origins: Vec<String>,
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出监听地址
    pub address: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、配置文件和环境变量加载配置
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CATALOGRS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.scraper.validate()?;
        settings.headlines.validate()?;
        Ok(settings)
    }

    /// 仅使用内置默认值构建配置，不读取文件和环境变量
    pub fn from_defaults() -> Result<Self, ConfigError> {
        let settings: Settings = Self::defaults()?.build()?.try_deserialize()?;
        settings.scraper.validate()?;
        settings.headlines.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Server
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            // Storage
            .set_default("redis.url", "redis://127.0.0.1:6379/0")?
            .set_default("storage.backend", "redis")?
            // Book scraper
            .set_default("scraper.base_url", "http://books.toscrape.com")?
            .set_default("scraper.max_books", 100)?
            .set_default("scraper.price_limit", 20.0)?
            .set_default("scraper.max_concurrent_requests", 5)?
            .set_default("scraper.request_timeout_secs", 10)?
            .set_default("scraper.page_delay_ms", 200)?
            .set_default("scraper.user_agent", DEFAULT_USER_AGENT)?
            .set_default("scraper.reject_unparseable_price", false)?
            // Headlines
            .set_default("headlines.url", "https://news.ycombinator.com/")?
            .set_default("headlines.pages", 5)?
            .set_default("headlines.max_concurrent_requests", 5)?
            // Rate limiting
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.requests_per_second", 1)?
            .set_default("rate_limiting.burst", 5)?
            // CORS
            .set_default("cors.allowed_origins", vec!["*"])?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.address", "0.0.0.0:9000")
    }
}

impl ScraperSettings {
    /// 校验抓取配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.base_url).is_err() {
            return Err(ConfigError::Message(format!(
                "scraper.base_url is not a valid URL: {}",
                self.base_url
            )));
        }
        if self.max_books == 0 {
            return Err(ConfigError::Message(
                "scraper.max_books must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Message(
                "scraper.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if self.price_limit.is_nan() || self.price_limit <= 0.0 {
            return Err(ConfigError::Message(
                "scraper.price_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl HeadlineSettings {
    /// 校验头条配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.url).is_err() {
            return Err(ConfigError::Message(format!(
                "headlines.url is not a valid URL: {}",
                self.url
            )));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Message(
                "headlines.max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
