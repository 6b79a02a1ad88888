// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 缓存（cache）：Redis客户端
/// - 指标（metrics）：Prometheus导出与计数器名称
/// - 仓库实现（repositories）：图书仓库接口的具体实现
pub mod cache;
pub mod metrics;
pub mod repositories;
