use super::fallback::{self, MODRINTH_PROFILE};
use super::{infer_category, is_recent, placeholder_image, ModSource, SourceBatch};
use crate::app::ports::{HttpClientPort, JsonRequest};
use crate::constants::*;
use crate::error::SourceError;
use crate::types::NewMod;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const BULK_FACETS: &str = r#"[["project_type:mod","categories:forge","categories:fabric"]]"#;
const PAGE_FACETS: &str = r#"[["project_type:mod"]]"#;

/// Modrinth public search API. Works anonymously; a key is sent when configured.
pub struct ModrinthSource {
    http: Arc<dyn HttpClientPort>,
    api_key: Option<String>,
    page_delay: Duration,
}

impl ModrinthSource {
    pub fn new(http: Arc<dyn HttpClientPort>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            page_delay: Duration::from_millis(300),
        }
    }

    /// Pause between sequential bulk pages
    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    fn search(&self, index: &str, facets: &str, offset: usize, limit: usize) -> JsonRequest {
        let mut request = JsonRequest::new(MODRINTH_SEARCH_URL)
            .query("limit", limit)
            .query("offset", offset)
            .query("index", index)
            .query("facets", facets);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key.as_str());
        }
        request
    }

    async fn hits(&self, request: &JsonRequest) -> Result<Vec<NewMod>, SourceError> {
        let body = self.http.get_json(request).await?;
        let hits = body["hits"]
            .as_array()
            .ok_or_else(|| SourceError::InvalidResponse {
                message: "Modrinth response has no hits array".to_string(),
            })?;
        let now = Utc::now();
        Ok(hits.iter().map(|hit| map_hit(hit, now)).collect())
    }

    /// One page of search results by relevance. Failures yield an empty batch.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, page: usize, page_size: usize) -> SourceBatch {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MODRINTH_PAGE_SIZE * 5);
        let request = self.search("relevance", PAGE_FACETS, (page - 1) * page_size, page_size);

        match self.hits(&request).await {
            Ok(mods) => {
                info!("Parsed {} mods from Modrinth page {}", mods.len(), page);
                SourceBatch::from_mods(mods)
            }
            Err(e) => {
                warn!("Modrinth page {} failed: {}", page, e);
                SourceBatch::default()
            }
        }
    }
}

fn map_hit(hit: &Value, now: DateTime<Utc>) -> NewMod {
    let name = hit["title"]
        .as_str()
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown Mod");
    let slug = hit["slug"]
        .as_str()
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown-mod");

    let tags: Vec<&str> = hit["categories"]
        .as_array()
        .map(|cats| cats.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let version = hit["versions"]
        .as_array()
        .and_then(|versions| versions.iter().rev().find_map(Value::as_str))
        .unwrap_or(DEFAULT_GAME_VERSION);

    NewMod {
        name: name.to_string(),
        description: hit["description"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("A mod from Modrinth")
            .to_string(),
        version: version.to_string(),
        category: infer_category(tags.as_slice()),
        download_count: Some(hit["downloads"].as_f64().unwrap_or(0.0).max(0.0) as u64),
        image_url: hit["icon_url"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_image(MOD_IMAGE_PLACEHOLDER, name)),
        download_url: format!("/download/{slug}"),
        source_url: format!("{MODRINTH_MOD_PAGE}/{slug}"),
        source: Some(MODRINTH_SOURCE.to_string()),
        is_new: Some(is_recent(hit["date_created"].as_str(), now)),
    }
}

#[async_trait::async_trait]
impl ModSource for ModrinthSource {
    fn name(&self) -> &'static str {
        MODRINTH_SOURCE
    }

    /// Most-downloaded mods, paged sequentially until `limit` is reached,
    /// a short page arrives, or a request fails.
    #[instrument(skip(self))]
    async fn fetch(&self, limit: usize) -> SourceBatch {
        if limit == 0 {
            return SourceBatch::default();
        }
        let max_pages = limit.div_ceil(MODRINTH_PAGE_SIZE).min(MODRINTH_MAX_PAGES);
        let mut mods: Vec<NewMod> = Vec::new();

        for page in 0..max_pages {
            if page > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
            let wanted = MODRINTH_PAGE_SIZE.min(limit - mods.len());
            let request = self.search("downloads", BULK_FACETS, mods.len(), wanted);
            match self.hits(&request).await {
                Ok(batch) => {
                    let short = batch.len() < wanted;
                    debug!("Modrinth page {} returned {} hits", page + 1, batch.len());
                    mods.extend(batch);
                    if short || mods.len() >= limit {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Modrinth page {} failed: {}", page + 1, e);
                    break;
                }
            }
        }
        mods.truncate(limit);

        if mods.is_empty() {
            warn!("Nothing fetched from Modrinth, using fallback data");
            let batch = fallback::generate(&MODRINTH_PROFILE);
            info!("Using {} fallback mods from Modrinth data", batch.mods.len());
            return batch;
        }

        info!("Parsed {} mods from Modrinth API", mods.len());
        SourceBatch::from_mods(mods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves `total` synthetic hits, honouring limit/offset; fails past `fail_after` calls
    struct PagedHttp {
        total: usize,
        fail_after: Option<usize>,
        seen: Mutex<Vec<JsonRequest>>,
    }

    impl PagedHttp {
        fn new(total: usize, fail_after: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                total,
                fail_after,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClientPort for PagedHttp {
        async fn get_json(&self, request: &JsonRequest) -> Result<Value, SourceError> {
            let calls = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(request.clone());
                seen.len()
            };
            if self.fail_after.is_some_and(|n| calls > n) {
                return Err(SourceError::Timeout(15));
            }
            let offset: usize = request.query_value("offset").unwrap().parse().unwrap();
            let limit: usize = request.query_value("limit").unwrap().parse().unwrap();
            let hits: Vec<Value> = (offset..self.total.min(offset + limit))
                .map(|i| {
                    json!({
                        "title": format!("Mod {i}"),
                        "slug": format!("mod-{i}"),
                        "categories": ["fabric", "technology"],
                        "versions": ["1.19.2", "1.20.4"],
                        "downloads": 1000 - i,
                    })
                })
                .collect();
            Ok(json!({ "hits": hits }))
        }
    }

    fn source(http: Arc<PagedHttp>) -> ModrinthSource {
        ModrinthSource::new(http, None).with_page_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn bulk_fetch_pages_sequentially_up_to_limit() {
        let http = PagedHttp::new(500, None);
        let batch = source(http.clone()).fetch(45).await;

        assert_eq!(batch.mods.len(), 45);
        assert_eq!(batch.mods[44].name, "Mod 44");
        let seen = http.seen.lock().unwrap();
        let offsets: Vec<&str> = seen.iter().filter_map(|r| r.query_value("offset")).collect();
        assert_eq!(offsets, vec!["0", "20", "40"]);
        assert_eq!(seen[2].query_value("limit"), Some("5"));
        assert_eq!(seen[0].query_value("index"), Some("downloads"));
    }

    #[tokio::test]
    async fn short_page_stops_the_walk() {
        let http = PagedHttp::new(25, None);
        let batch = source(http.clone()).fetch(100).await;

        assert_eq!(batch.mods.len(), 25);
        assert_eq!(http.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_results_survive_a_failed_page() {
        let http = PagedHttp::new(500, Some(1));
        let batch = source(http).fetch(60).await;

        assert_eq!(batch.mods.len(), 20);
        assert!(batch.mods.iter().all(|m| m.source.as_deref() == Some("Modrinth")));
    }

    #[tokio::test]
    async fn total_failure_serves_fallback() {
        let batch = source(PagedHttp::new(500, Some(0))).fetch(20).await;
        assert_eq!(batch, fallback::generate(&MODRINTH_PROFILE));
    }

    #[tokio::test]
    async fn zero_limit_fetches_nothing() {
        let http = PagedHttp::new(500, None);
        let batch = source(http.clone()).fetch(0).await;

        assert!(batch.is_empty());
        assert!(batch.categories.is_empty());
        assert!(http.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn page_fetch_maps_hits_and_returns_empty_on_failure() {
        let http = PagedHttp::new(500, None);
        let batch = source(http.clone()).fetch_page(3, 10).await;

        assert_eq!(batch.mods.len(), 10);
        let first = &batch.mods[0];
        assert_eq!(first.name, "Mod 20");
        assert_eq!(first.category, "Technology");
        assert_eq!(first.version, "1.20.4");
        assert_eq!(first.source_url, "https://modrinth.com/mod/mod-20");
        assert_eq!(http.seen.lock().unwrap()[0].query_value("index"), Some("relevance"));

        let failing = source(PagedHttp::new(500, Some(0))).fetch_page(1, 10).await;
        assert!(failing.is_empty());
    }

    #[test]
    fn sparse_hit_gets_defaults() {
        let m = map_hit(&json!({}), Utc::now());
        assert_eq!(m.name, "Unknown Mod");
        assert_eq!(m.description, "A mod from Modrinth");
        assert_eq!(m.category, "Utility");
        assert_eq!(m.version, DEFAULT_GAME_VERSION);
        assert_eq!(m.download_url, "/download/unknown-mod");
        assert_eq!(m.is_new, Some(false));
    }
}
