// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 并发闸门已关闭
    #[error("Concurrency gate closed")]
    GateClosed,
}

/// 已获取的页面
#[derive(Debug, Clone)]
pub struct Page {
    /// 最终URL（跟随重定向之后），用于解析相对链接
    pub url: Url,
    /// 响应正文
    pub html: String,
}

/// 抓取结果
///
/// 传输层错误和超时被归一化为 `NoContent`，调用方应将其视为"结束当前分支"而非致命错误
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Page(Page),
    NoContent,
}

impl FetchOutcome {
    pub fn into_page(self) -> Option<Page> {
        match self {
            FetchOutcome::Page(page) => Some(page),
            FetchOutcome::NoContent => None,
        }
    }
}

/// 页面获取特质
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 获取单个页面
    async fn fetch(&self, url: &Url) -> FetchOutcome;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
