// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::{
    models::{book::Book, category::category_slug},
    repositories::book_repository::{BookRepository, RepositoryError},
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    books: HashMap<String, Book>,
    /// slug -> book ids
    categories: HashMap<String, BTreeSet<String>>,
}

/// 内存中的图书仓库实现
///
/// 与 Redis 实现保持相同的键语义：同一标识符覆盖写入，分类索引只增不减。
/// 用于本地运行和测试。
#[derive(Clone, Default)]
pub struct MemoryBookRepository {
    store: Arc<RwLock<Store>>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已保存的图书数量
    pub async fn len(&self) -> usize {
        self.store.read().await.books.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn store_book(&self, book: &Book) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        store.books.insert(book.id.clone(), book.clone());
        store
            .categories
            .entry(category_slug(&book.category))
            .or_default()
            .insert(book.id.clone());
        Ok(())
    }

    async fn get_books(&self, category: Option<&str>) -> Result<Vec<Book>, RepositoryError> {
        let store = self.store.read().await;
        let books = match category {
            Some(category) => store
                .categories
                .get(&category_slug(category))
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| store.books.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default(),
            None => {
                let mut books: Vec<Book> = store.books.values().cloned().collect();
                books.sort_by(|a, b| a.id.cmp(&b.id));
                books
            }
        };
        Ok(books)
    }

    async fn ping(&self) -> bool {
        true
    }
}
