// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use catalogrs::domain::models::book::Book;
use catalogrs::domain::repositories::book_repository::{BookRepository, RepositoryError};
use catalogrs::domain::services::book_scrape_service::ScrapeConfig;
use catalogrs::engines::traits::{FetchOutcome, Page, PageFetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "http://books.test/";

/// 按URL返回预置页面的获取器，记录每个URL的请求次数和并发峰值
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, String>,
    counts: Mutex<HashMap<String, usize>>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// 每次获取前等待，用于制造任务交错
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.counts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.pages.get(url.as_str()) {
            Some(html) => FetchOutcome::Page(Page {
                url: url.clone(),
                html: html.clone(),
            }),
            None => FetchOutcome::NoContent,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// 每次写入都失败的仓库
pub struct FailingRepository;

#[async_trait]
impl BookRepository for FailingRepository {
    async fn store_book(&self, _book: &Book) -> Result<(), RepositoryError> {
        Err(RepositoryError::Backend("connection refused".to_string()))
    }

    async fn get_books(&self, _category: Option<&str>) -> Result<Vec<Book>, RepositoryError> {
        Err(RepositoryError::Backend("connection refused".to_string()))
    }

    async fn ping(&self) -> bool {
        false
    }
}

/// 首页：侧边导航中的分类 (名称, 相对链接)
pub fn root_page(categories: &[(&str, &str)]) -> String {
    let items: String = categories
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, name))
        .collect();
    format!(
        r#"<html><body>
             <div class="side_categories"><ul><li>
               <a href="catalogue/category/books_1/index.html">Books</a>
               <ul>{}</ul>
             </li></ul></div>
           </body></html>"#,
        items
    )
}

/// 列表页：图书 (标题, 价格文本)，可选的下一页相对链接
pub fn listing_page(books: &[(String, String)], next: Option<&str>) -> String {
    let pods: String = books
        .iter()
        .map(|(title, price)| {
            format!(
                r##"<li><article class="product_pod">
                     <div class="image_container"><a href="#"><img src="../../../media/cover.jpg" alt="{title}"></a></div>
                     <h3><a href="#" title="{title}">{title}</a></h3>
                     <div class="product_price"><p class="price_color">{price}</p></div>
                   </article></li>"##
            )
        })
        .collect();
    let pager = next
        .map(|href| format!(r#"<ul class="pager"><li class="next"><a href="{}">next</a></li></ul>"#, href))
        .unwrap_or_default();
    format!(
        "<html><body><section><ol class=\"row\">{}</ol>{}</section></body></html>",
        pods, pager
    )
}

/// 生成 count 本价格为 £10.00 的图书
pub fn cheap_books(prefix: &str, count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("{} #{}", prefix, i), "£10.00".to_string()))
        .collect()
}

pub fn category_url(slug: &str, page: &str) -> String {
    format!("{}catalogue/category/{}/{}", BASE_URL, slug, page)
}

pub fn category_href(slug: &str) -> String {
    format!("catalogue/category/{}/index.html", slug)
}

pub fn scrape_config(max_books: usize) -> ScrapeConfig {
    ScrapeConfig {
        base_url: Url::parse(BASE_URL).unwrap(),
        max_books,
        price_limit: 20.0,
        page_delay: Duration::ZERO,
        reject_unparseable_price: false,
    }
}
