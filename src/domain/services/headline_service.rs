// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::HeadlineSettings;
use crate::domain::models::headline::Headline;
use crate::engines::traits::{Page, PageFetcher};
use crate::utils::url_utils::resolve_url;
use backoff::future::retry;
use backoff::ExponentialBackoffBuilder;
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

static STORY_ROW: Lazy<Selector> = Lazy::new(|| selector("tr.athing"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector(".titleline > a"));
static SUBTEXT: Lazy<Selector> = Lazy::new(|| selector(".subtext"));
static SCORE: Lazy<Selector> = Lazy::new(|| selector("[class^='score_'], .score"));
/// 单次获取的最大页数
pub const MAX_PAGES: u32 = 5;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("Failed to compile digits regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to compile static selector")
}

/// 头条解析器
pub struct HeadlineParser;

impl HeadlineParser {
    /// 解析一页头条
    ///
    /// 缺少标题链接或紧随其后的 subtext 行的条目会被跳过
    pub fn parse(document: &Html, page_url: &Url) -> Vec<Headline> {
        let mut headlines = Vec::new();

        for row in document.select(&STORY_ROW) {
            let row_id = row.value().attr("id").unwrap_or("?");

            let Some(link) = row.select(&TITLE_LINK).next() else {
                warn!(story = row_id, "Story row without title link skipped");
                continue;
            };

            let Some(subtext) = row
                .next_siblings()
                .find_map(ElementRef::wrap)
                .filter(|next| next.select(&SUBTEXT).next().is_some())
            else {
                warn!(story = row_id, "Story row without subtext skipped");
                continue;
            };

            let url = link
                .value()
                .attr("href")
                .and_then(|href| resolve_url(page_url, href).ok())
                .map(|u| u.to_string())
                .unwrap_or_default();

            let score = subtext
                .select(&SCORE)
                .next()
                .map(|e| e.text().collect::<String>())
                .and_then(|text| {
                    DIGITS
                        .captures(&text)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                });

            headlines.push(Headline {
                title: link.text().collect::<String>().trim().to_string(),
                url,
                score,
            });
        }

        headlines
    }
}

/// 页面加载重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次重试前的等待时间
    pub initial_interval: Duration,
    /// 单次等待上限
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(10),
        }
    }
}

/// 新闻头条服务
///
/// 与图书抓取相同的 获取/解析/限量 模式的简化版本：
/// 各页并发获取（受同一并发闸门约束），每页按指数退避重试，
/// 重试耗尽的页只记录日志并跳过
pub struct HeadlineService {
    fetcher: Arc<dyn PageFetcher>,
    base_url: Url,
    pages: u32,
    retry: RetryPolicy,
}

impl HeadlineService {
    pub fn new(fetcher: Arc<dyn PageFetcher>, base_url: Url, pages: u32) -> Self {
        Self {
            fetcher,
            base_url,
            pages: pages.min(MAX_PAGES),
            retry: RetryPolicy::default(),
        }
    }

    /// 替换页面加载重试策略
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 从配置创建服务
    pub fn from_settings(
        fetcher: Arc<dyn PageFetcher>,
        settings: &HeadlineSettings,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(fetcher, Url::parse(&settings.url)?, settings.pages))
    }

    /// 第 N 页的URL，第一页为站点根，其余为 `news?p=N`
    pub fn page_url(&self, page: u32) -> Url {
        if page <= 1 {
            return self.base_url.clone();
        }
        let mut url = self
            .base_url
            .join("news")
            .unwrap_or_else(|_| self.base_url.clone());
        url.query_pairs_mut().append_pair("p", &page.to_string());
        url
    }

    /// 获取头条，按页顺序拼接
    pub async fn fetch_top_stories(&self) -> Vec<Headline> {
        let fetches = (1..=self.pages).map(|page| async move {
            let url = self.page_url(page);
            match self.load_page(&url).await {
                Some(fetched) => Self::parse_page(&fetched, page),
                None => {
                    warn!(page, url = %url, "Headline page unavailable");
                    Vec::new()
                }
            }
        });

        let headlines: Vec<Headline> = join_all(fetches).await.into_iter().flatten().collect();
        info!(count = headlines.len(), "Fetched headlines");
        headlines
    }

    /// 加载单页，失败时按退避策略重试，最多 `max_attempts` 次
    async fn load_page(&self, url: &Url) -> Option<Page> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.retry.initial_interval)
            .with_multiplier(2.0)
            .with_max_interval(self.retry.max_interval)
            .with_max_elapsed_time(None)
            .build();

        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let fetcher = &self.fetcher;
        let max_attempts = self.retry.max_attempts.max(1);

        retry(policy, move || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            match fetcher.fetch(url).await.into_page() {
                Some(page) => Ok(page),
                None if attempt < max_attempts => {
                    debug!(url = %url, attempt, "Headline page load failed, retrying");
                    Err(backoff::Error::transient(attempt))
                }
                None => Err(backoff::Error::permanent(attempt)),
            }
        })
        .await
        .ok()
    }

    fn parse_page(page: &Page, page_number: u32) -> Vec<Headline> {
        let document = Html::parse_document(&page.html);
        let headlines = HeadlineParser::parse(&document, &page.url);
        info!(page = page_number, count = headlines.len(), "Parsed headline page");
        headlines
    }

    /// 获取头条，可选按标题关键字（不区分大小写）过滤
    pub async fn search_news(&self, query: Option<&str>) -> Vec<Headline> {
        let stories = self.fetch_top_stories().await;
        match query.map(str::to_lowercase) {
            Some(query) if !query.is_empty() => stories
                .into_iter()
                .filter(|story| story.title.to_lowercase().contains(&query))
                .collect(),
            _ => stories,
        }
    }
}
