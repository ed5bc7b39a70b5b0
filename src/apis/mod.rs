pub mod curseforge;
pub mod fallback;
pub mod modrinth;

pub use curseforge::CurseForgeSource;
pub use modrinth::ModrinthSource;

use crate::constants::{
    CATEGORY_IMAGE_PLACEHOLDER, DEFAULT_CATEGORY, MOD_LOADERS, NEW_MOD_WINDOW_DAYS,
};
use crate::types::{NewCategory, NewMod};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::collections::HashSet;

/// Normalized output of one provider run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    pub mods: Vec<NewMod>,
    pub categories: Vec<NewCategory>,
}

impl SourceBatch {
    /// Batch whose categories are the distinct categories of `mods`, first occurrence first
    pub fn from_mods(mods: Vec<NewMod>) -> Self {
        let mut seen = HashSet::new();
        let categories = mods
            .iter()
            .filter(|m| seen.insert(m.category.clone()))
            .map(|m| NewCategory {
                name: m.category.clone(),
                image_url: placeholder_image(CATEGORY_IMAGE_PLACEHOLDER, &m.category),
            })
            .collect();
        Self { mods, categories }
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty() && self.categories.is_empty()
    }
}

/// A best-effort provider of catalog entries.
///
/// `fetch` never fails: provider errors are logged and replaced by whatever
/// the implementation can offer instead, usually synthetic fallback data.
#[async_trait]
pub trait ModSource: Send + Sync {
    /// Provenance label written to `Mod::source`
    fn name(&self) -> &'static str;

    async fn fetch(&self, limit: usize) -> SourceBatch;
}

/// First tag that is not a mod loader, capitalized; `Utility` when there is none
pub fn infer_category<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .find(|tag| {
            !tag.is_empty()
                && !MOD_LOADERS
                    .iter()
                    .any(|loader| loader.eq_ignore_ascii_case(tag))
        })
        .map(capitalize)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Created within the last 30 days of `now`. Missing or unparseable dates are not new.
pub fn is_recent(created: Option<&str>, now: DateTime<Utc>) -> bool {
    created
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc) > now - Duration::days(NEW_MOD_WINDOW_DAYS))
        .unwrap_or(false)
}

/// Placeholder image service URL with `text` as its caption
pub fn placeholder_image(base: &str, text: &str) -> String {
    Url::parse_with_params(base, &[("text", text)])
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// URL slug for a mod name: lowercase, whitespace runs to `-`, apostrophes dropped
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace(['\'', '’'], "");
    WHITESPACE.replace_all(&lowered, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn category_skips_loader_tags() {
        assert_eq!(infer_category(&["forge", "Fabric", "magic"]), "Magic");
        assert_eq!(infer_category(&["quilt", "liteloader"]), "Utility");
        assert_eq!(infer_category::<&str>(&[]), "Utility");
        assert_eq!(infer_category(&["worldgen"]), "Worldgen");
    }

    #[test]
    fn recent_window_is_thirty_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        assert!(is_recent(Some("2024-06-10T00:00:00Z"), now));
        assert!(!is_recent(Some("2024-04-01T00:00:00Z"), now));
        assert!(!is_recent(Some("not a date"), now));
        assert!(!is_recent(None, now));
    }

    #[test]
    fn slug_drops_apostrophes() {
        assert_eq!(slugify("Biomes O' Plenty"), "biomes-o-plenty");
        assert_eq!(slugify("Nature's  Compass"), "natures-compass");
    }

    #[test]
    fn placeholder_encodes_caption() {
        let url = placeholder_image(CATEGORY_IMAGE_PLACEHOLDER, "World Generation");
        assert!(url.starts_with(CATEGORY_IMAGE_PLACEHOLDER));
        assert!(url.ends_with("text=World+Generation"));
    }

    #[test]
    fn batch_categories_are_distinct_in_order() {
        let mk = |name: &str, category: &str| NewMod {
            name: name.into(),
            description: String::new(),
            version: "1.20.1".into(),
            category: category.into(),
            download_count: None,
            image_url: String::new(),
            download_url: String::new(),
            source_url: String::new(),
            source: None,
            is_new: None,
        };
        let batch = SourceBatch::from_mods(vec![
            mk("a", "Magic"),
            mk("b", "Storage"),
            mk("c", "Magic"),
        ]);
        let names: Vec<&str> = batch.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Magic", "Storage"]);
    }
}
