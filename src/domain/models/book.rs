// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// 图书
///
/// 从目录页面抓取的一条图书记录，创建后在一次运行内不再修改
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// 由标题派生的稳定标识符
    pub id: String,
    pub title: String,
    pub price: f64,
    pub category: String,
    pub image_url: String,
}

impl Book {
    /// 创建图书，标识符由标题计算得出
    pub fn new(title: String, price: f64, category: String, image_url: String) -> Self {
        Self {
            id: book_id(&title),
            title,
            price,
            category,
            image_url,
        }
    }
}

/// 根据标题计算图书标识符
///
/// 只使用标题参与哈希，不同分类下的同名图书会得到相同的标识符并在存储中相互覆盖。
pub fn book_id(title: &str) -> String {
    hex::encode(Md5::digest(title.as_bytes()))
}
