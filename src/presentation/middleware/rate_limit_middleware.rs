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

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::config::settings::RateLimitingSettings;

/// 速率限制错误类型
#[derive(Error, Debug)]
pub enum RateLimitError {
    /// 请求过多错误
    #[error("Too many requests")]
    TooManyRequests,

    /// 配置的配额无效
    #[error("Invalid rate limit quota: {0}")]
    InvalidQuota(String),
}

/// API 速率限制器
///
/// 进程内的全局令牌桶，未启用时放行所有请求
pub struct ApiRateLimiter {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl ApiRateLimiter {
    /// 根据配置创建速率限制器
    ///
    /// # 返回值
    ///
    /// * `Ok(ApiRateLimiter)` - 速率限制器
    /// * `Err(RateLimitError)` - 每秒请求数或突发容量为0
    pub fn from_settings(settings: &RateLimitingSettings) -> Result<Self, RateLimitError> {
        if !settings.enabled {
            return Ok(Self::disabled());
        }

        let rps = NonZeroU32::new(settings.requests_per_second).ok_or_else(|| {
            RateLimitError::InvalidQuota("requests_per_second must be non-zero".to_string())
        })?;
        let burst = NonZeroU32::new(settings.burst)
            .ok_or_else(|| RateLimitError::InvalidQuota("burst must be non-zero".to_string()))?;

        let quota = Quota::per_second(rps).allow_burst(burst);
        Ok(Self {
            limiter: Some(RateLimiter::direct(quota)),
        })
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    /// 尝试消耗一个令牌
    pub fn check(&self) -> Result<(), RateLimitError> {
        match &self.limiter {
            Some(limiter) => limiter
                .check()
                .map_err(|_| RateLimitError::TooManyRequests),
            None => Ok(()),
        }
    }
}

/// 速率限制中间件
///
/// 超出配额时返回 429
pub async fn rate_limit_middleware(
    Extension(rate_limiter): Extension<Arc<ApiRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = rate_limiter.check() {
        warn!(path = %request.uri().path(), "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    next.run(request).await
}
