use crate::constants::{
    is_filter_sentinel, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, UNKNOWN_SOURCE,
};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry for one third-party Minecraft mod
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub version: String,
    /// Category name; not checked against the categories table
    pub category: String,
    pub download_count: u64,
    pub image_url: String,
    pub download_url: String,
    /// External page the download endpoint redirects to
    pub source_url: String,
    pub source: String,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a mod; the store assigns id and creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMod {
    pub name: String,
    pub description: String,
    pub version: String,
    pub category: String,
    #[serde(default)]
    pub download_count: Option<u64>,
    pub image_url: String,
    pub download_url: String,
    pub source_url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub is_new: Option<bool>,
}

impl NewMod {
    /// Materialize a stored row with creation defaults applied
    pub fn into_mod(self, id: i64, created_at: DateTime<Utc>) -> Mod {
        Mod {
            id,
            name: self.name,
            description: self.description,
            version: self.version,
            category: self.category,
            download_count: self.download_count.unwrap_or(0),
            image_url: self.image_url,
            download_url: self.download_url,
            source_url: self.source_url,
            source: self
                .source
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            is_new: self.is_new.unwrap_or(false),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinecraftVersion {
    pub id: i64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMinecraftVersion {
    pub version: String,
}

/// A registered account. The hash is never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// What the API reveals about a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Popular,
    Recent,
    Name,
    Downloads,
}

impl SortBy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "popular" => Some(Self::Popular),
            "recent" => Some(Self::Recent),
            "name" => Some(Self::Name),
            "downloads" => Some(Self::Downloads),
            _ => None,
        }
    }
}

/// Search, filter, sort and page selection for `Storage::list_mods`
#[derive(Debug, Clone, PartialEq)]
pub struct ModFilter {
    pub search: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    /// `None` sorts by download count, most downloaded first
    pub sort_by: Option<SortBy>,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ModFilter {
    fn default() -> Self {
        Self {
            search: None,
            version: None,
            category: None,
            source: None,
            sort_by: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ModFilter {
    pub fn first_page(sort_by: SortBy, page_size: usize) -> Self {
        Self {
            sort_by: Some(sort_by),
            page_size,
            ..Self::default()
        }
    }

    /// Lowercased search term, if one is set
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn version_filter(&self) -> Option<&str> {
        active(&self.version)
    }

    pub fn category_filter(&self) -> Option<&str> {
        active(&self.category)
    }

    pub fn source_filter(&self) -> Option<&str> {
        active(&self.source)
    }

    pub fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    pub fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Rows to skip before the requested page
    pub fn offset(&self) -> usize {
        (self.effective_page() - 1).saturating_mul(self.effective_page_size())
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_filter_sentinel(v))
}

/// One page of a filtered, sorted listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: usize, filter: &ModFilter) -> Self {
        let page_size = filter.effective_page_size();
        Self {
            data,
            total,
            page: filter.effective_page(),
            page_size,
            page_count: total.div_ceil(page_size),
        }
    }
}

/// Creation timestamp at the precision both stores can represent
pub fn now_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_mod() -> NewMod {
        NewMod {
            name: "Create".into(),
            description: "Rotational power".into(),
            version: "1.20.1".into(),
            category: "Technology".into(),
            download_count: None,
            image_url: "img".into(),
            download_url: "/download/create".into(),
            source_url: "https://example.com/create".into(),
            source: None,
            is_new: None,
        }
    }

    #[test]
    fn into_mod_applies_creation_defaults() {
        let now = now_timestamp();
        let m = new_mod().into_mod(7, now);
        assert_eq!(m.id, 7);
        assert_eq!(m.download_count, 0);
        assert!(!m.is_new);
        assert_eq!(m.source, "unknown");
        assert_eq!(m.created_at, now);
    }

    #[test]
    fn filter_treats_sentinels_as_absent() {
        let filter = ModFilter {
            version: Some("All Versions".into()),
            category: Some("Magic".into()),
            source: Some("all".into()),
            ..ModFilter::default()
        };
        assert_eq!(filter.version_filter(), None);
        assert_eq!(filter.category_filter(), Some("Magic"));
        assert_eq!(filter.source_filter(), None);
    }

    #[test]
    fn page_count_rounds_up() {
        let filter = ModFilter {
            page_size: 3,
            ..ModFilter::default()
        };
        let page: Paginated<u8> = Paginated::new(vec![], 7, &filter);
        assert_eq!(page.page_count, 3);
        let empty: Paginated<u8> = Paginated::new(vec![], 0, &filter);
        assert_eq!(empty.page_count, 0);
    }

    #[test]
    fn mod_serializes_camel_case() {
        let m = new_mod().into_mod(1, now_timestamp());
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("downloadCount").is_some());
        assert!(json.get("sourceUrl").is_some());
        assert!(json.get("isNew").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn sort_by_parses_known_values_only() {
        assert_eq!(SortBy::parse("Recent"), Some(SortBy::Recent));
        assert_eq!(SortBy::parse("downloads"), Some(SortBy::Downloads));
        assert_eq!(SortBy::parse("rating"), None);
    }
}
