// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    category_href, category_url, cheap_books, listing_page, root_page, scrape_config,
    FailingRepository, ScriptedFetcher, BASE_URL,
};
use async_trait::async_trait;
use catalogrs::domain::repositories::book_repository::BookRepository;
use catalogrs::domain::services::book_scrape_service::{BookScrapeService, DoneReason, ScrapeError};
use catalogrs::engines::traits::{FetchOutcome, PageFetcher};
use catalogrs::infrastructure::repositories::memory_book_repo::MemoryBookRepository;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn service(
    fetcher: Arc<ScriptedFetcher>,
    repo: Arc<dyn BookRepository>,
    max_books: usize,
) -> BookScrapeService {
    BookScrapeService::new(fetcher, repo, scrape_config(max_books))
}

/// 三页分类链：恰好获取三次后结束
#[tokio::test]
async fn test_three_page_chain_terminates_after_three_fetches() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(BASE_URL, root_page(&[("Travel", &category_href("travel"))]))
            .with_page(
                &category_url("travel", "index.html"),
                listing_page(&cheap_books("Travel p1", 2), Some("page-2.html")),
            )
            .with_page(
                &category_url("travel", "page-2.html"),
                listing_page(&cheap_books("Travel p2", 2), Some("page-3.html")),
            )
            .with_page(
                &category_url("travel", "page-3.html"),
                listing_page(&cheap_books("Travel p3", 2), None),
            ),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher.clone(), repo.clone(), 100)
        .scrape_books()
        .await
        .unwrap();

    assert_eq!(report.books.len(), 6);
    assert_eq!(repo.len().await, 6);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].pages_fetched, 3);
    assert_eq!(report.categories[0].reason, DoneReason::LastPage);

    for page in ["index.html", "page-2.html", "page-3.html"] {
        assert_eq!(fetcher.fetch_count(&category_url("travel", page)), 1);
    }
    // root + three listing pages
    assert_eq!(fetcher.total_fetches(), 4);
}

/// 上限落在页中：只接受前5本，不再获取第二页
#[tokio::test]
async fn test_cap_reached_mid_page_truncates_and_stops() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(BASE_URL, root_page(&[("Poetry", &category_href("poetry"))]))
            .with_page(
                &category_url("poetry", "index.html"),
                listing_page(&cheap_books("Poem", 8), Some("page-2.html")),
            )
            .with_page(
                &category_url("poetry", "page-2.html"),
                listing_page(&cheap_books("Poem p2", 8), None),
            ),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher.clone(), repo.clone(), 5)
        .scrape_books()
        .await
        .unwrap();

    assert_eq!(report.books.len(), 5);
    assert_eq!(repo.len().await, 5);
    // first-come in page order
    let titles: Vec<&str> = report.books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Poem #0", "Poem #1", "Poem #2", "Poem #3", "Poem #4"]);

    let outcome = &report.categories[0];
    assert_eq!(outcome.accepted, 5);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.reason, DoneReason::CapReached);
    assert_eq!(fetcher.fetch_count(&category_url("poetry", "page-2.html")), 0);
}

/// 首页没有导航结构是致命错误
#[tokio::test]
async fn test_missing_navigation_is_fatal() {
    let fetcher = Arc::new(
        ScriptedFetcher::new().with_page(BASE_URL, "<html><body><p>maintenance</p></body></html>"),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let result = service(fetcher, repo.clone(), 100).scrape_books().await;

    assert!(matches!(result, Err(ScrapeError::NoCategories(_))));
    assert!(repo.is_empty().await);
}

/// 首页不可用同样是致命错误
#[tokio::test]
async fn test_unreachable_root_is_fatal() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let repo = Arc::new(MemoryBookRepository::new());

    let result = service(fetcher.clone(), repo, 100).scrape_books().await;

    assert!(matches!(result, Err(ScrapeError::NoCategories(_))));
    assert_eq!(fetcher.total_fetches(), 1);
}

/// 多分类并发时全局上限永远不会被超过
#[tokio::test]
async fn test_cap_holds_across_interleaved_categories() {
    let slugs: Vec<String> = (0..8).map(|i| format!("cat-{}", i)).collect();
    let hrefs: Vec<String> = slugs.iter().map(|s| category_href(s)).collect();
    let nav: Vec<(&str, &str)> = slugs
        .iter()
        .zip(hrefs.iter())
        .map(|(s, h)| (s.as_str(), h.as_str()))
        .collect();

    let mut fetcher = ScriptedFetcher::new()
        .with_delay(Duration::from_millis(5))
        .with_page(BASE_URL, root_page(&nav));
    for slug in &slugs {
        fetcher = fetcher
            .with_page(
                &category_url(slug, "index.html"),
                listing_page(&cheap_books(&format!("{} p1", slug), 4), Some("page-2.html")),
            )
            .with_page(
                &category_url(slug, "page-2.html"),
                listing_page(&cheap_books(&format!("{} p2", slug), 4), Some("page-3.html")),
            )
            .with_page(
                &category_url(slug, "page-3.html"),
                listing_page(&cheap_books(&format!("{} p3", slug), 4), None),
            );
    }
    let fetcher = Arc::new(fetcher);
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher.clone(), repo.clone(), 10)
        .scrape_books()
        .await
        .unwrap();

    assert_eq!(report.books.len(), 10);
    assert_eq!(repo.len().await, 10);
    assert_eq!(report.categories.len(), 8);
    assert_eq!(report.categories.iter().map(|c| c.accepted).sum::<usize>(), 10);
    assert!(report
        .categories
        .iter()
        .all(|c| c.reason == DoneReason::CapReached));
    // categories were traversed concurrently
    assert!(fetcher.peak_in_flight() > 1);
}

/// 只有价格不超过上限的图书会被接受，边界值保留
#[tokio::test]
async fn test_price_ceiling_is_applied() {
    let books = vec![
        ("Cheap".to_string(), "£10.00".to_string()),
        ("Boundary".to_string(), "£20.00".to_string()),
        ("Just over".to_string(), "£20.01".to_string()),
        ("Expensive".to_string(), "£55.00".to_string()),
    ];
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(BASE_URL, root_page(&[("Mystery", &category_href("mystery"))]))
            .with_page(&category_url("mystery", "index.html"), listing_page(&books, None)),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher, repo, 100).scrape_books().await.unwrap();

    let titles: Vec<&str> = report.books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Cheap", "Boundary"]);
    assert!(report.books.iter().all(|b| b.price <= 20.0));
}

/// 整页都被价格过滤时分类结束，不再翻页
#[tokio::test]
async fn test_page_without_qualifying_items_ends_category() {
    let expensive = vec![("Folio".to_string(), "£99.00".to_string())];
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(BASE_URL, root_page(&[("Art", &category_href("art"))]))
            .with_page(
                &category_url("art", "index.html"),
                listing_page(&expensive, Some("page-2.html")),
            )
            .with_page(
                &category_url("art", "page-2.html"),
                listing_page(&cheap_books("Art", 3), None),
            ),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher.clone(), repo, 100).scrape_books().await.unwrap();

    assert!(report.books.is_empty());
    assert_eq!(report.categories[0].reason, DoneReason::NoItems);
    assert_eq!(fetcher.fetch_count(&category_url("art", "page-2.html")), 0);
}

/// 持久化失败的图书仍然计入结果
#[tokio::test]
async fn test_persist_failure_still_counts_book() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(BASE_URL, root_page(&[("Humor", &category_href("humor"))]))
            .with_page(
                &category_url("humor", "index.html"),
                listing_page(&cheap_books("Joke", 3), None),
            ),
    );

    let report = service(fetcher, Arc::new(FailingRepository), 2)
        .scrape_books()
        .await
        .unwrap();

    assert_eq!(report.books.len(), 2);
    assert_eq!(report.categories[0].accepted, 2);
    assert_eq!(report.categories[0].reason, DoneReason::CapReached);
}

/// 获取失败只结束当前分类，已接受的图书保留
#[tokio::test]
async fn test_fetch_failure_ends_traversal_branch() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_page(
                BASE_URL,
                root_page(&[
                    ("Music", &category_href("music")),
                    ("Sports", &category_href("sports")),
                ]),
            )
            .with_page(
                &category_url("music", "index.html"),
                listing_page(&cheap_books("Song", 2), Some("page-2.html")),
            )
            // music page 2 is missing
            .with_page(
                &category_url("sports", "index.html"),
                listing_page(&cheap_books("Match", 3), None),
            ),
    );
    let repo = Arc::new(MemoryBookRepository::new());

    let report = service(fetcher, repo, 100).scrape_books().await.unwrap();

    assert_eq!(report.books.len(), 5);
    // outcomes keep discovery order
    let music = &report.categories[0];
    assert_eq!(music.category, "Music");
    assert_eq!(music.pages_fetched, 2);
    assert_eq!(music.accepted, 2);
    assert_eq!(music.reason, DoneReason::NoContent);
    assert_eq!(report.categories[1].reason, DoneReason::LastPage);
}

/// 价格无法解析的图书：默认按 0.0 接受，配置后丢弃
#[tokio::test]
async fn test_unparseable_price_policy() {
    let books = vec![
        ("Priceless".to_string(), "call us".to_string()),
        ("Priced".to_string(), "£5.00".to_string()),
    ];
    let build = || {
        Arc::new(
            ScriptedFetcher::new()
                .with_page(BASE_URL, root_page(&[("Misc", &category_href("misc"))]))
                .with_page(&category_url("misc", "index.html"), listing_page(&books, None)),
        )
    };

    let lenient = service(build(), Arc::new(MemoryBookRepository::new()), 100)
        .scrape_books()
        .await
        .unwrap();
    assert_eq!(lenient.books.len(), 2);
    assert_eq!(lenient.books[0].price, 0.0);

    let mut strict_config = scrape_config(100);
    strict_config.reject_unparseable_price = true;
    let strict = BookScrapeService::new(build(), Arc::new(MemoryBookRepository::new()), strict_config)
        .scrape_books()
        .await
        .unwrap();
    assert_eq!(strict.books.len(), 1);
    assert_eq!(strict.books[0].title, "Priced");
}

struct PanickingFetcher;

#[async_trait]
impl PageFetcher for PanickingFetcher {
    async fn fetch(&self, _url: &Url) -> FetchOutcome {
        panic!("fetcher exploded");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// 未预期的缺陷在协调器边界被捕获
#[tokio::test]
async fn test_unexpected_defect_is_contained() {
    let service = BookScrapeService::new(
        Arc::new(PanickingFetcher),
        Arc::new(MemoryBookRepository::new()),
        scrape_config(10),
    );

    match service.scrape_books().await {
        Err(ScrapeError::Unexpected(message)) => assert!(message.contains("fetcher exploded")),
        other => panic!("expected unexpected-defect error, got {:?}", other.map(|r| r.books.len())),
    }
}
