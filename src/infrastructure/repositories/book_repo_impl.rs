// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    models::{book::Book, category::category_slug},
    repositories::book_repository::{BookRepository, RepositoryError},
};
use crate::infrastructure::cache::redis_client::RedisClient;

const BOOK_KEY_PREFIX: &str = "book:";
const CATEGORY_KEY_PREFIX: &str = "category:";

fn book_key(id: &str) -> String {
    format!("{}{}", BOOK_KEY_PREFIX, id)
}

fn category_key(category: &str) -> String {
    format!("{}{}", CATEGORY_KEY_PREFIX, category_slug(category))
}

/// Redis 图书仓库实现
///
/// 主记录保存在哈希 `book:{id}` 中，分类索引保存在集合 `category:{slug}` 中。
pub struct RedisBookRepository {
    client: Arc<RedisClient>,
}

impl RedisBookRepository {
    pub fn new(client: Arc<RedisClient>) -> Self {
        Self { client }
    }

    async fn load(&self, id: &str) -> Result<Option<Book>, RepositoryError> {
        let fields = self
            .client
            .hgetall(&book_key(id))
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;

        if fields.is_empty() {
            // index entry outlived its record
            debug!(book_id = id, "Indexed book has no record");
            return Ok(None);
        }
        book_from_hash(id, &fields).map(Some)
    }
}

fn book_fields(book: &Book) -> Vec<(&'static str, String)> {
    vec![
        ("id", book.id.clone()),
        ("title", book.title.clone()),
        ("price", book.price.to_string()),
        ("category", book.category.clone()),
        ("image_url", book.image_url.clone()),
    ]
}

/// 从哈希字段还原图书，标识符以键为准
fn book_from_hash(id: &str, fields: &HashMap<String, String>) -> Result<Book, RepositoryError> {
    let field = |name: &str| {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| RepositoryError::Corrupt {
                key: book_key(id),
                reason: format!("missing field '{}'", name),
            })
    };

    let price = field("price")?
        .parse::<f64>()
        .map_err(|e| RepositoryError::Corrupt {
            key: book_key(id),
            reason: format!("invalid price: {}", e),
        })?;

    Ok(Book {
        id: id.to_string(),
        title: field("title")?,
        price,
        category: field("category")?,
        image_url: fields.get("image_url").cloned().unwrap_or_default(),
    })
}

#[async_trait]
impl BookRepository for RedisBookRepository {
    async fn store_book(&self, book: &Book) -> Result<(), RepositoryError> {
        let fields = book_fields(book);
        self.client
            .hset_with_index(
                &book_key(&book.id),
                &fields,
                &category_key(&book.category),
                &book.id,
            )
            .await
            .map_err(|e| RepositoryError::Backend(e.to_string()))
    }

    async fn get_books(&self, category: Option<&str>) -> Result<Vec<Book>, RepositoryError> {
        let ids: Vec<String> = match category {
            Some(category) => self
                .client
                .smembers(&category_key(category))
                .await
                .map_err(|e| RepositoryError::Backend(e.to_string()))?,
            None => self
                .client
                .keys(&format!("{}*", BOOK_KEY_PREFIX))
                .await
                .map_err(|e| RepositoryError::Backend(e.to_string()))?
                .into_iter()
                .filter_map(|key| key.strip_prefix(BOOK_KEY_PREFIX).map(str::to_string))
                .collect(),
        };

        let mut books = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(&id).await {
                Ok(Some(book)) => books.push(book),
                Ok(None) => {}
                Err(RepositoryError::Corrupt { key, reason }) => {
                    warn!(key = %key, reason = %reason, "Skipping corrupt book record");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(books)
    }

    async fn ping(&self) -> bool {
        match self.client.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Redis ping failed");
                false
            }
        }
    }
}
