// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json, Query};
use std::sync::Arc;

use crate::{
    application::dto::book_request::HeadlineQueryDto,
    domain::{models::headline::HeadlineList, services::headline_service::HeadlineService},
};

/// 实时获取新闻头条，可选按关键字过滤
pub async fn get_headlines(
    Extension(service): Extension<Arc<HeadlineService>>,
    Query(query): Query<HeadlineQueryDto>,
) -> Json<HeadlineList> {
    let headlines = service.search_news(query.query()).await;
    Json(HeadlineList { headlines })
}
