// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{cheap_books, listing_page, root_page};
use axum::{
    extract::{Path as AxumPath, State},
    response::Html,
    routing::get,
    Router,
};
use catalogrs::domain::repositories::book_repository::BookRepository;
use catalogrs::domain::services::book_scrape_service::{BookScrapeService, DoneReason, ScrapeConfig};
use catalogrs::engines::reqwest_engine::{EngineConfig, ReqwestEngine};
use catalogrs::infrastructure::repositories::memory_book_repo::MemoryBookRepository;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(permits: usize) -> Arc<ReqwestEngine> {
    Arc::new(
        ReqwestEngine::new(EngineConfig {
            max_concurrent_requests: permits,
            timeout: Duration::from_secs(5),
            user_agent: "catalogrs-test/1.0".to_string(),
        })
        .unwrap(),
    )
}

fn config(base_url: &str, max_books: usize) -> ScrapeConfig {
    ScrapeConfig {
        base_url: Url::parse(base_url).unwrap(),
        max_books,
        price_limit: 20.0,
        page_delay: Duration::from_millis(10),
        reject_unparseable_price: false,
    }
}

async fn mount_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// 通过真实HTTP栈完成一次抓取
#[tokio::test]
async fn test_scrape_against_http_site() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        200,
        root_page(&[
            ("Poetry", "catalogue/category/books/poetry_23/index.html"),
            ("Travel", "catalogue/category/books/travel_2/index.html"),
            ("Horror", "catalogue/category/books/horror_31/index.html"),
        ]),
    )
    .await;
    mount_html(
        &server,
        "/catalogue/category/books/poetry_23/index.html",
        200,
        listing_page(&cheap_books("Poem", 3), Some("page-2.html")),
    )
    .await;
    mount_html(
        &server,
        "/catalogue/category/books/poetry_23/page-2.html",
        200,
        listing_page(&cheap_books("Late poem", 2), None),
    )
    .await;
    mount_html(
        &server,
        "/catalogue/category/books/travel_2/index.html",
        200,
        listing_page(&cheap_books("Trip", 4), None),
    )
    .await;
    mount_html(
        &server,
        "/catalogue/category/books/horror_31/index.html",
        500,
        "boom".to_string(),
    )
    .await;

    let repo = Arc::new(MemoryBookRepository::new());
    let service = BookScrapeService::new(engine(2), repo.clone(), config(&server.uri(), 100));

    let report = service.scrape_books().await.unwrap();

    assert_eq!(report.books.len(), 9);
    assert_eq!(report.categories[0].reason, DoneReason::LastPage);
    assert_eq!(report.categories[0].pages_fetched, 2);
    assert_eq!(report.categories[2].reason, DoneReason::NoContent);

    let poetry = repo.get_books(Some("poetry")).await.unwrap();
    assert_eq!(poetry.len(), 5);
    let expected_image = format!("{}/catalogue/media/cover.jpg", server.uri());
    assert!(poetry.iter().all(|b| b.image_url == expected_image));
}

#[derive(Default)]
struct Gauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

async fn counted_listing(
    State(gauge): State<Arc<Gauge>>,
    AxumPath(slug): AxumPath<String>,
) -> Html<String> {
    let now = gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    gauge.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    Html(listing_page(&cheap_books(&slug, 3), None))
}

async fn start_catalog_server(categories: usize, gauge: Arc<Gauge>) -> String {
    let hrefs: Vec<(String, String)> = (0..categories)
        .map(|i| (format!("cat-{}", i), format!("cat/cat-{}/index.html", i)))
        .collect();
    let root = root_page(
        &hrefs
            .iter()
            .map(|(name, href)| (name.as_str(), href.as_str()))
            .collect::<Vec<_>>(),
    );

    let app = Router::new()
        .route(
            "/",
            get(move || {
                let root = root.clone();
                async move { Html(root) }
            }),
        )
        .route("/cat/{slug}/index.html", get(counted_listing))
        .with_state(gauge);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

/// 分类数大于并发闸门时，同时在途的请求数不超过许可数
#[tokio::test]
async fn test_gate_bounds_concurrent_fetches_across_categories() {
    let gauge = Arc::new(Gauge::default());
    let base_url = start_catalog_server(6, gauge.clone()).await;

    let repo = Arc::new(MemoryBookRepository::new());
    let service = BookScrapeService::new(engine(2), repo.clone(), config(&base_url, 100));

    let report = service.scrape_books().await.unwrap();

    assert_eq!(report.categories.len(), 6);
    assert_eq!(report.books.len(), 18);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 2);
    assert!(gauge.peak.load(Ordering::SeqCst) >= 1);
}
