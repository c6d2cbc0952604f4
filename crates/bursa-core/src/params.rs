//! Query parameter normalisation.
//!
//! Everything here is total: malformed or missing input falls back to a
//! default instead of producing an error.

use serde::{Deserialize, Serialize};

use crate::Category;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;
pub const MAX_SEARCH_LEN: usize = 100;

/// Bounded page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageParams {
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(DEFAULT_PAGE);

        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT as i64) as u32)
            .unwrap_or(DEFAULT_LIMIT);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Pagination block returned next to every paged result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(params: PageParams, total: i64) -> Self {
        let limit = params.limit.max(1) as i64;
        let total = total.max(0);
        Self {
            page: params.page,
            limit: params.limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

/// Trim and bound a free-text query. Blank input yields `None`.
pub fn sanitize_search(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let bounded: String = trimmed.chars().take(MAX_SEARCH_LEN).collect();
    Some(bounded.trim_end().to_string())
}

/// Parse `true`/`false` for the premium filter; anything else means "no filter".
pub fn parse_premium(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub const MAX_SYMBOL_LEN: usize = 20;

/// Upper-cased, trimmed ticker, or `None` for anything that is not a plain
/// symbol: ASCII alphanumerics plus `.`/`-` for exchange suffixes, with an
/// optional leading `^` for indices.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    let body = symbol.strip_prefix('^').unwrap_or(&symbol);
    let valid = symbol.len() <= MAX_SYMBOL_LEN
        && body.starts_with(|c: char| c.is_ascii_alphanumeric())
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'));
    valid.then_some(symbol)
}

pub fn parse_category(raw: Option<&str>) -> Option<Category> {
    raw.and_then(Category::parse)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Relevance,
    #[default]
    Date,
    Views,
}

impl SortKey {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("relevance") => SortKey::Relevance,
            Some("views") => SortKey::Views,
            _ => SortKey::Date,
        }
    }
}
