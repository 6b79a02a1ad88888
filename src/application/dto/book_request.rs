// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// 图书列表查询DTO
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BookQueryDto {
    /// 分类过滤
    pub category: Option<String>,
}

impl BookQueryDto {
    pub fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }
}

/// 图书搜索DTO
///
/// 标题和分类至少提供一个
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_search_criteria"))]
pub struct BookSearchDto {
    /// 标题关键字（不区分大小写的子串）
    #[validate(length(max = 256, message = "Title is too long"))]
    pub title: Option<String>,
    /// 分类过滤
    #[validate(length(max = 128, message = "Category is too long"))]
    pub category: Option<String>,
}

impl BookSearchDto {
    pub fn title(&self) -> Option<&str> {
        non_empty(&self.title)
    }

    pub fn category(&self) -> Option<&str> {
        non_empty(&self.category)
    }
}

fn validate_search_criteria(dto: &BookSearchDto) -> Result<(), ValidationError> {
    if dto.title().is_none() && dto.category().is_none() {
        let mut error = ValidationError::new("missing_criteria");
        error.message = Some(Cow::from(
            "At least one search parameter (title or category) is required",
        ));
        return Err(error);
    }
    Ok(())
}

/// 头条查询DTO
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HeadlineQueryDto {
    /// 标题关键字
    pub q: Option<String>,
}

impl HeadlineQueryDto {
    pub fn query(&self) -> Option<&str> {
        non_empty(&self.q)
    }
}
