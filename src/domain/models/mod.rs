// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 包含图书、分类、遍历游标和新闻头条等核心数据结构
pub mod book;
pub mod category;
pub mod headline;
