// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 安装Prometheus导出器并注册计数器
///
/// # 参数
///
/// * `address` - 导出监听地址，如 `0.0.0.0:9000`
pub fn init_metrics(address: &str) -> Result<()> {
    let addr: SocketAddr = address
        .parse()
        .with_context(|| format!("Invalid metrics address: {}", address))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus recorder")?;

    describe_counter!(
        "catalogrs_pages_fetched_total",
        "Total number of catalog pages fetched"
    );
    describe_counter!(
        "catalogrs_fetch_failures_total",
        "Total number of page fetches that yielded no content"
    );
    describe_counter!(
        "catalogrs_books_accepted_total",
        "Total number of books accepted under the global cap"
    );
    describe_counter!(
        "catalogrs_persist_failures_total",
        "Total number of accepted books that failed to persist"
    );

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}
