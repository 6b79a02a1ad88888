// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 图书分类
///
/// 每次运行从站点首页发现一次，之后不再改变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub start_url: Url,
}

/// 遍历游标
///
/// 归属于单个分类遍历任务，页码单调递增
#[derive(Debug, Clone)]
pub struct TraversalCursor {
    pub category: String,
    pub current_url: Url,
    pub page_number: u32,
}

impl TraversalCursor {
    pub fn start(category: &Category) -> Self {
        Self {
            category: category.name.clone(),
            current_url: category.start_url.clone(),
            page_number: 1,
        }
    }

    /// 前进到下一页
    pub fn advance(&mut self, next_url: Url) {
        self.current_url = next_url;
        self.page_number += 1;
    }
}

/// 分类在存储索引中使用的键片段
pub fn category_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}
