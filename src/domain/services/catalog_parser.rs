// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::book::Book;
use crate::domain::models::category::Category;
use crate::utils::url_utils::resolve_url;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{error, warn};
use url::Url;

static CATEGORY_NAV: Lazy<Selector> = Lazy::new(|| selector("div.side_categories > ul > li > ul"));
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| selector("li"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static PRODUCT_POD: Lazy<Selector> = Lazy::new(|| selector("article.product_pod"));
static TITLE_LINK: Lazy<Selector> = Lazy::new(|| selector("h3 a"));
static PRICE: Lazy<Selector> = Lazy::new(|| selector(".price_color"));
static IMAGE: Lazy<Selector> = Lazy::new(|| selector(".image_container img"));
static NEXT_LINK: Lazy<Selector> = Lazy::new(|| selector("li.next > a"));

static PRICE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[£$€]\s*(\d+(?:\.\d+)?)").expect("Failed to compile price regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to compile static selector")
}

/// 页面解析错误
#[derive(Error, Debug)]
pub enum ParseError {
    /// 页面缺少必需的结构
    #[error("Missing element: {0}")]
    MissingElement(&'static str),
    /// 链接无法解析为绝对URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 从价格文本中解析数值
///
/// 查找带货币符号前缀的十进制数，例如 "£12.99"
pub fn parse_price(text: &str) -> Option<f64> {
    PRICE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// 分类列表解析器
///
/// 解析站点首页的侧边导航，得到 (名称, 起始URL) 集合
pub struct CategoryLister;

impl CategoryLister {
    /// 解析分类
    ///
    /// # 参数
    ///
    /// * `document` - 首页文档
    /// * `base_url` - 用于解析相对链接的基础URL
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<Category>)` - 页面顺序的分类列表
    /// * `Err(ParseError)` - 导航结构缺失
    pub fn list(document: &Html, base_url: &Url) -> Result<Vec<Category>, ParseError> {
        let nav = document
            .select(&CATEGORY_NAV)
            .next()
            .ok_or(ParseError::MissingElement("div.side_categories > ul > li > ul"))?;

        let mut categories = Vec::new();
        for item in nav.select(&LIST_ITEM) {
            let Some(link) = item.select(&ANCHOR).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                warn!("Category link without href skipped");
                continue;
            };
            let start_url = match resolve_url(base_url, href) {
                Ok(url) => url,
                Err(e) => {
                    warn!(href, error = %e, "Unresolvable category link skipped");
                    continue;
                }
            };
            categories.push(Category {
                name: element_text(link),
                start_url,
            });
        }

        Ok(categories)
    }
}

/// 图书提取器
///
/// 按页面顺序解析图书条目，应用价格上限过滤
#[derive(Debug, Clone)]
pub struct BookExtractor {
    /// 价格上限，价格严格大于该值的图书被跳过
    pub price_limit: f64,
    /// 价格无法解析时是否丢弃图书（否则按 0.0 处理）
    pub reject_unparseable_price: bool,
}

impl BookExtractor {
    pub fn new(price_limit: f64, reject_unparseable_price: bool) -> Self {
        Self {
            price_limit,
            reject_unparseable_price,
        }
    }

    /// 从页面中提取图书
    ///
    /// 任一条目缺少标题、价格或图片结构时，整页视为格式错误
    ///
    /// # 参数
    ///
    /// * `document` - 页面文档
    /// * `page_url` - 页面URL，用于解析图片相对路径
    /// * `category` - 分类名称
    pub fn extract(
        &self,
        document: &Html,
        page_url: &Url,
        category: &str,
    ) -> Result<Vec<Book>, ParseError> {
        let mut books = Vec::new();

        for pod in document.select(&PRODUCT_POD) {
            let title_link = pod
                .select(&TITLE_LINK)
                .next()
                .ok_or(ParseError::MissingElement("h3 a"))?;
            let title = match title_link.value().attr("title") {
                Some(title) => title.trim().to_string(),
                None => element_text(title_link),
            };

            let price_text = pod
                .select(&PRICE)
                .next()
                .map(element_text)
                .ok_or(ParseError::MissingElement(".price_color"))?;
            let price = match parse_price(&price_text) {
                Some(price) => price,
                None => {
                    error!(title = %title, price_text = %price_text, "Failed to parse price");
                    if self.reject_unparseable_price {
                        continue;
                    }
                    0.0
                }
            };

            if price > self.price_limit {
                continue;
            }

            let image = pod
                .select(&IMAGE)
                .next()
                .ok_or(ParseError::MissingElement(".image_container img"))?;
            let src = image.value().attr("src").unwrap_or_default();
            let image_url = resolve_url(page_url, src)?;

            books.push(Book::new(
                title,
                price,
                category.to_string(),
                image_url.to_string(),
            ));
        }

        Ok(books)
    }
}

/// 分页解析器
pub struct PaginationResolver;

impl PaginationResolver {
    /// 解析下一页URL
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Url))` - 下一页的绝对URL
    /// * `Ok(None)` - 没有"下一页"控件，分类结束
    /// * `Err(ParseError)` - 控件存在但链接无效
    pub fn next_page(document: &Html, current_url: &Url) -> Result<Option<Url>, ParseError> {
        let Some(next) = document.select(&NEXT_LINK).next() else {
            return Ok(None);
        };
        let href = next
            .value()
            .attr("href")
            .ok_or(ParseError::MissingElement("li.next > a[href]"))?;
        Ok(Some(resolve_url(current_url, href)?))
    }
}
