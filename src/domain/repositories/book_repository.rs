// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::book::Book;
use async_trait::async_trait;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 存储后端错误
    #[error("Storage backend error: {0}")]
    Backend(String),
    /// 存储中的记录无法还原
    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// 图书仓库特质
///
/// 以标识符为主键保存图书，并维护按分类的二级索引。
/// 同一标识符重复写入是幂等的覆盖操作。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 保存图书：先写主记录，再更新分类索引
    async fn store_book(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 获取全部图书，或指定分类下的图书
    async fn get_books(&self, category: Option<&str>) -> Result<Vec<Book>, RepositoryError>;

    /// 按标题（不区分大小写的子串）和/或分类搜索图书
    async fn search_books(
        &self,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Book>, RepositoryError> {
        let books = self.get_books(category).await?;
        Ok(match title {
            Some(title) => {
                let needle = title.to_lowercase();
                books
                    .into_iter()
                    .filter(|b| b.title.to_lowercase().contains(&needle))
                    .collect()
            }
            None => books,
        })
    }

    /// 检查存储是否可用
    async fn ping(&self) -> bool;
}
