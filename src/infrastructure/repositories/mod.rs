// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供图书仓库接口的 Redis 实现和内存实现
pub mod book_repo_impl;
pub mod memory_book_repo;
