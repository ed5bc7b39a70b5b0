//! Translation of raw listing parameters into a store query.

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::error::Result;
use crate::storage::Storage;
use crate::types::{Mod, ModFilter, Paginated, SortBy};
use serde::Deserialize;

/// Listing parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModListQuery {
    pub search: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ModListQuery {
    /// Filter values pass through untouched; the store decides what counts as "all".
    /// Unknown sorts fall back to the default order, bad numbers to the defaults.
    pub fn to_filter(&self) -> ModFilter {
        ModFilter {
            search: self.search.clone(),
            version: self.version.clone(),
            category: self.category.clone(),
            source: self.source.clone(),
            sort_by: self.sort_by.as_deref().and_then(SortBy::parse),
            page: positive_or(self.page.as_deref(), DEFAULT_PAGE),
            page_size: positive_or(self.page_size.as_deref(), DEFAULT_PAGE_SIZE),
        }
    }
}

fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Coerce a `limit` parameter; missing, non-numeric or zero means `default`
pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    positive_or(raw, default)
}

pub async fn list_mods(store: &dyn Storage, query: &ModListQuery) -> Result<Paginated<Mod>> {
    store.list_mods(&query.to_filter()).await
}
