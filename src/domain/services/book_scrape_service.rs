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
use crate::domain::models::book::Book;
use crate::domain::models::category::{Category, TraversalCursor};
use crate::domain::repositories::book_repository::BookRepository;
use crate::domain::services::catalog_parser::{BookExtractor, CategoryLister, PaginationResolver};
use crate::engines::traits::{Page, PageFetcher};
use futures::future::join_all;
use futures::FutureExt;
use scraper::Html;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

/// 抓取运行配置
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// 站点根URL
    pub base_url: Url,
    /// 全局图书上限
    pub max_books: usize,
    /// 价格上限
    pub price_limit: f64,
    /// 同一分类内翻页间隔
    pub page_delay: Duration,
    /// 价格无法解析时是否丢弃
    pub reject_unparseable_price: bool,
}

impl TryFrom<&ScraperSettings> for ScrapeConfig {
    type Error = url::ParseError;

    fn try_from(settings: &ScraperSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            base_url: Url::parse(&settings.base_url)?,
            max_books: settings.max_books,
            price_limit: settings.price_limit,
            page_delay: Duration::from_millis(settings.page_delay_ms),
            reject_unparseable_price: settings.reject_unparseable_price,
        })
    }
}

/// 抓取运行的致命错误
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 首页不可用或没有分类导航
    #[error("No categories discovered at {0}")]
    NoCategories(String),
    /// 运行期间出现未预期的缺陷
    #[error("Unexpected failure during collection: {0}")]
    Unexpected(String),
}

/// 分类遍历结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// 页面获取失败
    NoContent,
    /// 页面没有可接受的图书
    NoItems,
    /// 全局上限已达到
    CapReached,
    /// 没有下一页
    LastPage,
}

/// 分类遍历状态机
///
/// FETCHING → EXTRACTING → ACCOUNTING → (ADVANCING | DONE)
enum TraversalState {
    Fetching,
    Extracting(Page),
    Accounting {
        books: Vec<Book>,
        next_url: Option<Url>,
    },
    Advancing(Url),
    Done(DoneReason),
}

/// 单个分类的遍历结果
#[derive(Debug, Clone)]
pub struct CategoryOutcome {
    pub category: String,
    /// 发起的页面请求次数
    pub pages_fetched: u32,
    /// 该分类被接受的图书数
    pub accepted: usize,
    pub reason: DoneReason,
}

/// 一次抓取运行的结果
#[derive(Debug, Default)]
pub struct ScrapeReport {
    /// 按接受顺序排列的图书
    ///
    /// 各分类交错推进，同一分类的图书不保证连续出现
    pub books: Vec<Book>,
    /// 按分类发现顺序排列的遍历结果
    pub categories: Vec<CategoryOutcome>,
}

/// 跨分类共享的计数状态，只在锁内读写
#[derive(Default)]
struct Collection {
    accepted: usize,
    books: Vec<Book>,
}

struct Acceptance {
    taken: usize,
    truncated: bool,
}

/// 图书抓取服务
///
/// 每个分类一个遍历任务，所有任务在同一个执行上下文中并发推进，
/// 共享一个全局计数器和一把协调锁。全局上限是硬上限，永远不会被超过。
pub struct BookScrapeService {
    fetcher: Arc<dyn PageFetcher>,
    repo: Arc<dyn BookRepository>,
    config: ScrapeConfig,
    extractor: BookExtractor,
}

impl BookScrapeService {
    /// 创建新的图书抓取服务
    ///
    /// # 参数
    ///
    /// * `fetcher` - 页面获取器（内部带并发闸门）
    /// * `repo` - 图书仓库
    /// * `config` - 运行配置
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        repo: Arc<dyn BookRepository>,
        config: ScrapeConfig,
    ) -> Self {
        let extractor = BookExtractor::new(config.price_limit, config.reject_unparseable_price);
        Self {
            fetcher,
            repo,
            config,
            extractor,
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// 执行一次完整的抓取运行
    ///
    /// # 返回值
    ///
    /// * `Ok(ScrapeReport)` - 被接受的图书（可能为空）及各分类结果
    /// * `Err(ScrapeError)` - 没有发现分类，或运行中出现未预期的缺陷
    pub async fn scrape_books(&self) -> Result<ScrapeReport, ScrapeError> {
        match AssertUnwindSafe(self.collect()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(error = %message, "Book collection aborted");
                Err(ScrapeError::Unexpected(message))
            }
        }
    }

    async fn collect(&self) -> Result<ScrapeReport, ScrapeError> {
        let categories = self.discover_categories().await;
        if categories.is_empty() {
            error!(base_url = %self.config.base_url, "No categories could be discovered");
            return Err(ScrapeError::NoCategories(self.config.base_url.to_string()));
        }

        let collection = Mutex::new(Collection::default());
        let outcomes = join_all(
            categories
                .iter()
                .map(|category| self.scrape_category(category, &collection)),
        )
        .await;

        let collection = collection.into_inner();
        info!(
            total = collection.books.len(),
            categories = outcomes.len(),
            "Book collection finished"
        );

        Ok(ScrapeReport {
            books: collection.books,
            categories: outcomes,
        })
    }

    /// 获取首页并解析分类
    ///
    /// 首页不可用或导航结构缺失时返回空列表
    pub async fn discover_categories(&self) -> Vec<Category> {
        let Some(page) = self.fetcher.fetch(&self.config.base_url).await.into_page() else {
            return Vec::new();
        };
        self.parse_categories(&page)
    }

    fn parse_categories(&self, page: &Page) -> Vec<Category> {
        let document = Html::parse_document(&page.html);
        match CategoryLister::list(&document, &self.config.base_url) {
            Ok(categories) => {
                info!(count = categories.len(), "Discovered categories");
                categories
            }
            Err(e) => {
                error!(url = %page.url, error = %e, "Failed to extract categories");
                Vec::new()
            }
        }
    }

    /// 遍历单个分类
    async fn scrape_category(
        &self,
        category: &Category,
        collection: &Mutex<Collection>,
    ) -> CategoryOutcome {
        let mut cursor = TraversalCursor::start(category);
        let mut pages_fetched = 0;
        let mut accepted = 0;
        let mut state = TraversalState::Fetching;

        info!(category = %category.name, "Starting category traversal");

        let reason = loop {
            state = match state {
                TraversalState::Fetching => {
                    if collection.lock().await.accepted >= self.config.max_books {
                        TraversalState::Done(DoneReason::CapReached)
                    } else {
                        debug!(
                            category = %cursor.category,
                            page = cursor.page_number,
                            url = %cursor.current_url,
                            "Fetching page"
                        );
                        pages_fetched += 1;
                        match self.fetcher.fetch(&cursor.current_url).await.into_page() {
                            Some(page) => TraversalState::Extracting(page),
                            None => TraversalState::Done(DoneReason::NoContent),
                        }
                    }
                }
                TraversalState::Extracting(page) => {
                    let (books, next_url) = self.parse_listing(&page, &cursor.category);
                    if books.is_empty() {
                        TraversalState::Done(DoneReason::NoItems)
                    } else {
                        TraversalState::Accounting { books, next_url }
                    }
                }
                TraversalState::Accounting { books, next_url } => {
                    let acceptance = self.accept(books, collection).await;
                    accepted += acceptance.taken;
                    // A partially accepted page never retries its remainder.
                    if acceptance.taken == 0 || acceptance.truncated {
                        TraversalState::Done(DoneReason::CapReached)
                    } else {
                        match next_url {
                            Some(next) => TraversalState::Advancing(next),
                            None => TraversalState::Done(DoneReason::LastPage),
                        }
                    }
                }
                TraversalState::Advancing(next) => {
                    cursor.advance(next);
                    if !self.config.page_delay.is_zero() {
                        tokio::time::sleep(self.config.page_delay).await;
                    }
                    TraversalState::Fetching
                }
                TraversalState::Done(reason) => break reason,
            };
        };

        info!(
            category = %category.name,
            pages = pages_fetched,
            accepted,
            reason = ?reason,
            "Category traversal finished"
        );

        CategoryOutcome {
            category: category.name.clone(),
            pages_fetched,
            accepted,
            reason,
        }
    }

    /// 解析列表页：提取图书并解析下一页
    ///
    /// 提取失败视为空页，分页失败视为最后一页，均只记录日志
    fn parse_listing(&self, page: &Page, category: &str) -> (Vec<Book>, Option<Url>) {
        let document = Html::parse_document(&page.html);

        let books = self
            .extractor
            .extract(&document, &page.url, category)
            .unwrap_or_else(|e| {
                error!(url = %page.url, category, error = %e, "Failed to extract books");
                Vec::new()
            });

        let next_url = PaginationResolver::next_page(&document, &page.url).unwrap_or_else(|e| {
            error!(url = %page.url, error = %e, "Failed to resolve next page");
            None
        });

        (books, next_url)
    }

    /// 在协调锁内完成 "检查剩余名额、预留、持久化、提交" 的整个过程
    async fn accept(&self, books: Vec<Book>, collection: &Mutex<Collection>) -> Acceptance {
        let mut collection = collection.lock().await;

        let remaining = self.config.max_books.saturating_sub(collection.accepted);
        let total = books.len();
        let taken = remaining.min(total);

        for book in books.into_iter().take(taken) {
            if let Err(e) = self.repo.store_book(&book).await {
                metrics::counter!("catalogrs_persist_failures_total").increment(1);
                warn!(book_id = %book.id, title = %book.title, error = %e, "Failed to persist book");
            }
            collection.books.push(book);
        }
        collection.accepted += taken;
        metrics::counter!("catalogrs_books_accepted_total").increment(taken as u64);

        Acceptance {
            taken,
            truncated: taken < total,
        }
    }
}
