// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：图书、分类、头条等实体
/// - 仓库接口（repositories）：图书持久化抽象接口
/// - 服务（services）：目录解析、抓取协调和头条获取
///
/// 领域层只依赖页面获取器和仓库两个抽象接口。
pub mod models;
pub mod repositories;
pub mod services;
