use super::fallback::{self, CURSEFORGE_PROFILE};
use super::{infer_category, is_recent, placeholder_image, ModSource, SourceBatch};
use crate::app::ports::{HttpClientPort, JsonRequest};
use crate::constants::*;
use crate::error::SourceError;
use crate::types::NewMod;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// CurseForge official API. Requires an API key; without one it serves fallback data.
pub struct CurseForgeSource {
    http: Arc<dyn HttpClientPort>,
    api_key: Option<String>,
}

impl CurseForgeSource {
    pub fn new(http: Arc<dyn HttpClientPort>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn try_fetch(&self, limit: usize) -> Result<SourceBatch, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingCredentials("CURSEFORGE_API_KEY"))?;

        let request = JsonRequest::new(CURSEFORGE_SEARCH_URL)
            .query("gameId", CURSEFORGE_MINECRAFT_GAME_ID)
            .query("classId", CURSEFORGE_MODS_CLASS_ID)
            .query("sortField", CURSEFORGE_SORT_POPULARITY)
            .query("sortOrder", "desc")
            .query("pageSize", limit.clamp(1, CURSEFORGE_MAX_PAGE_SIZE))
            .header("x-api-key", api_key);

        let body = self.http.get_json(&request).await?;
        let hits = body["data"]
            .as_array()
            .ok_or_else(|| SourceError::InvalidResponse {
                message: "CurseForge response has no data array".to_string(),
            })?;

        let now = Utc::now();
        let mods: Vec<NewMod> = hits.iter().filter_map(|hit| map_hit(hit, now)).collect();

        info!("Parsed {} mods from CurseForge official API", mods.len());
        Ok(SourceBatch::from_mods(mods))
    }
}

/// Map one search hit; hits without a name are skipped
fn map_hit(hit: &Value, now: DateTime<Utc>) -> Option<NewMod> {
    let Some(name) = hit["name"].as_str().filter(|n| !n.is_empty()) else {
        debug!("Skipping CurseForge hit without a name: id={}", hit["id"]);
        return None;
    };

    let tags: Vec<&str> = hit["categories"]
        .as_array()
        .map(|cats| cats.iter().filter_map(|c| c["name"].as_str()).collect())
        .unwrap_or_default();

    let slug = hit["slug"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| hit["id"].as_i64().map(|id| id.to_string()))
        .unwrap_or_default();

    let version = hit["latestFilesIndexes"]
        .as_array()
        .and_then(|files| files.iter().find_map(|f| f["gameVersion"].as_str()))
        .unwrap_or(DEFAULT_GAME_VERSION);

    Some(NewMod {
        name: name.to_string(),
        description: hit["summary"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("A Minecraft mod")
            .to_string(),
        version: version.to_string(),
        category: infer_category(tags.as_slice()),
        download_count: Some(hit["downloadCount"].as_f64().unwrap_or(0.0).max(0.0) as u64),
        image_url: hit["logo"]["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_image(MOD_IMAGE_PLACEHOLDER, name)),
        download_url: format!("/download/{slug}"),
        source_url: format!("{CURSEFORGE_MOD_PAGE}/{slug}"),
        source: Some(CURSEFORGE_SOURCE.to_string()),
        is_new: Some(is_recent(hit["dateCreated"].as_str(), now)),
    })
}

#[async_trait::async_trait]
impl ModSource for CurseForgeSource {
    fn name(&self) -> &'static str {
        CURSEFORGE_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self, limit: usize) -> SourceBatch {
        if limit == 0 {
            return SourceBatch::default();
        }
        match self.try_fetch(limit).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!("CurseForge unavailable ({}), using fallback data", e);
                let batch = fallback::generate(&CURSEFORGE_PROFILE);
                info!("Using {} fallback mods from CurseForge data", batch.mods.len());
                batch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedHttp {
        body: Value,
        seen: Mutex<Vec<JsonRequest>>,
    }

    #[async_trait]
    impl HttpClientPort for CannedHttp {
        async fn get_json(&self, request: &JsonRequest) -> Result<Value, SourceError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.body.clone())
        }
    }

    fn canned(body: Value) -> Arc<CannedHttp> {
        Arc::new(CannedHttp {
            body,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn maps_search_hits() {
        let http = canned(json!({
            "data": [{
                "id": 238222,
                "name": "Just Enough Items",
                "slug": "jei",
                "summary": "View items and recipes",
                "downloadCount": 300000000.0,
                "logo": { "url": "https://media.forgecdn.net/jei.png" },
                "categories": [{ "name": "API and Library" }],
                "latestFilesIndexes": [{ "gameVersion": "1.21.1" }],
                "dateCreated": "2015-11-23T18:46:27Z"
            }, {
                "id": 1,
                "summary": "nameless"
            }]
        }));
        let source = CurseForgeSource::new(http.clone(), Some("key".into()));
        let batch = source.fetch(10).await;

        assert_eq!(batch.mods.len(), 1);
        let jei = &batch.mods[0];
        assert_eq!(jei.name, "Just Enough Items");
        assert_eq!(jei.category, "API and Library");
        assert_eq!(jei.version, "1.21.1");
        assert_eq!(jei.download_count, Some(300_000_000));
        assert_eq!(jei.source_url, "https://www.curseforge.com/minecraft/mc-mods/jei");
        assert_eq!(jei.download_url, "/download/jei");
        assert_eq!(jei.is_new, Some(false));

        let seen = http.seen.lock().unwrap();
        assert_eq!(seen[0].query_value("pageSize"), Some("10"));
        assert!(seen[0].headers.iter().any(|(k, v)| k == "x-api-key" && v == "key"));
    }

    #[tokio::test]
    async fn missing_key_serves_fallback_without_calling_out() {
        let http = canned(json!({}));
        let source = CurseForgeSource::new(http.clone(), None);
        let batch = source.fetch(10).await;

        assert!(!batch.mods.is_empty());
        assert!(!batch.categories.is_empty());
        assert!(http.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_is_an_empty_batch() {
        let http = canned(json!({ "data": [] }));
        let batch = CurseForgeSource::new(http.clone(), None).fetch(0).await;
        assert!(batch.is_empty());
        assert!(http.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_response_serves_fallback() {
        let source = CurseForgeSource::new(canned(json!({ "error": "nope" })), Some("k".into()));
        let batch = source.fetch(5).await;
        assert_eq!(batch, fallback::generate(&CURSEFORGE_PROFILE));
    }
}
