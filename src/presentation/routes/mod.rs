// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{CorsSettings, Settings};
use crate::domain::repositories::book_repository::BookRepository;
use crate::domain::services::book_scrape_service::BookScrapeService;
use crate::domain::services::headline_service::HeadlineService;
use crate::presentation::handlers::{book_handler, headline_handler};
use crate::presentation::middleware::rate_limit_middleware::{
    rate_limit_middleware, ApiRateLimiter,
};
use anyhow::Context;
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 应用依赖
pub struct AppComponents {
    pub repo: Arc<dyn BookRepository>,
    pub scraper: Arc<BookScrapeService>,
    pub headlines: Arc<HeadlineService>,
    pub settings: Arc<Settings>,
}

/// 创建应用路由
///
/// # 返回值
///
/// 返回未挂载依赖的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check));

    let api_routes = Router::new()
        .route("/api/v1", get(api_index))
        .route("/api/v1/version", get(version))
        .route("/api/v1/init", post(book_handler::init_books))
        .route("/api/v1/books", get(book_handler::get_books))
        .route("/api/v1/books/search", get(book_handler::search_books))
        .route("/api/v1/headlines", get(headline_handler::get_headlines))
        .layer(axum::middleware::from_fn(rate_limit_middleware));

    Router::new().merge(public_routes).merge(api_routes)
}

/// 构建完整应用：路由、依赖扩展、限流、CORS 和请求追踪
pub fn build_app(components: AppComponents) -> anyhow::Result<Router> {
    let rate_limiter = Arc::new(
        ApiRateLimiter::from_settings(&components.settings.rate_limiting)
            .context("Failed to create rate limiter")?,
    );
    let cors = cors_layer(&components.settings.cors)?;

    Ok(routes()
        .layer(Extension(rate_limiter))
        .layer(Extension(components.repo))
        .layer(Extension(components.scraper))
        .layer(Extension(components.headlines))
        .layer(Extension(components.settings))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(settings: &CorsSettings) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if settings.allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = settings
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// 状态端点
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Book API is running",
        "documentation": "/api/v1",
    }))
}

/// 端点列表
pub async fn api_index() -> Json<Value> {
    Json(json!({
        "endpoints": [
            "GET /api/v1/version",
            "POST /api/v1/init",
            "GET /api/v1/books?category=",
            "GET /api/v1/books/search?title=&category=",
            "GET /api/v1/headlines?q=",
        ]
    }))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
