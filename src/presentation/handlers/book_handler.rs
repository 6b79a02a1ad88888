// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json, Query};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::{
    application::dto::book_request::{BookQueryDto, BookSearchDto},
    domain::{
        models::book::Book, repositories::book_repository::BookRepository,
        services::book_scrape_service::BookScrapeService,
    },
    presentation::errors::AppError,
};

/// 运行一次抓取并返回被接受的图书
///
/// # 错误
///
/// - 没有发现分类或运行中出现未预期的缺陷
/// - 没有任何图书被接受
pub async fn init_books(
    Extension(service): Extension<Arc<BookScrapeService>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let report = service.scrape_books().await?;

    if report.books.is_empty() {
        return Err(AppError::from(anyhow::anyhow!(
            "Failed to initialize the book database: no books collected"
        )));
    }

    info!(
        books = report.books.len(),
        categories = report.categories.len(),
        "Book database initialized"
    );
    Ok(Json(report.books))
}

/// 获取全部图书或指定分类的图书
pub async fn get_books(
    Extension(repo): Extension<Arc<dyn BookRepository>>,
    Query(query): Query<BookQueryDto>,
) -> Result<Json<Vec<Book>>, AppError> {
    let books = repo.get_books(query.category()).await?;
    Ok(Json(books))
}

/// 按标题和/或分类搜索图书
pub async fn search_books(
    Extension(repo): Extension<Arc<dyn BookRepository>>,
    Query(query): Query<BookSearchDto>,
) -> Result<Json<Vec<Book>>, AppError> {
    query.validate()?;

    let books = repo.search_books(query.title(), query.category()).await?;
    Ok(Json(books))
}
