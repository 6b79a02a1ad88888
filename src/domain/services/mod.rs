// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 目录解析（catalog_parser）：分类列表、图书提取和分页解析
/// - 图书抓取（book_scrape_service）：多分类并发遍历与全局上限协调
/// - 新闻头条（headline_service）：多页头条获取与过滤
pub mod book_scrape_service;
pub mod catalog_parser;
pub mod headline_service;
