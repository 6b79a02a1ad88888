// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将页面中的链接解析为绝对URL
///
/// 链接两端的空白会被去掉，页面模板中换行包裹的 href 很常见
pub fn resolve_url(base_url: &Url, href: &str) -> Result<Url, ParseError> {
    base_url.join(href.trim())
}
