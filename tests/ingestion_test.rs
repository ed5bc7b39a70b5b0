use anyhow::Result;
use async_trait::async_trait;
use modvoyage::apis::fallback::FALLBACK_SIZE;
use modvoyage::apis::{CurseForgeSource, ModSource, SourceBatch};
use modvoyage::app::ports::{HttpClientPort, JsonRequest};
use modvoyage::error::SourceError;
use modvoyage::pipeline::{aggregate, auto_ingest, IngestionWriter};
use modvoyage::storage::{seed, DatabaseStorage, Storage};
use modvoyage::types::{ModFilter, SortBy};
use serde_json::Value;
use std::sync::Arc;
use tempfile::tempdir;

struct Unreachable;

#[async_trait]
impl HttpClientPort for Unreachable {
    async fn get_json(&self, request: &JsonRequest) -> Result<Value, SourceError> {
        Err(SourceError::InvalidResponse {
            message: format!("no route to {}", request.url),
        })
    }
}

struct Panicking;

#[async_trait]
impl ModSource for Panicking {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn fetch(&self, _limit: usize) -> SourceBatch {
        panic!("source crashed mid-fetch");
    }
}

fn curseforge_without_key() -> Arc<dyn ModSource> {
    Arc::new(CurseForgeSource::new(Arc::new(Unreachable), None))
}

#[tokio::test]
async fn auto_ingest_replaces_seed_data_on_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("catalog").join("mods.db");

    {
        let store: Arc<dyn Storage> = Arc::new(DatabaseStorage::open(&path)?);
        seed::seed_if_empty(store.as_ref()).await?;
        assert_eq!(store.list_mods(&ModFilter::default()).await?.total, 8);

        let sources = vec![Arc::new(Panicking) as Arc<dyn ModSource>, curseforge_without_key()];
        let report = auto_ingest(store.clone(), &sources, 20).await?;
        assert_eq!(report.saved_mods(), FALLBACK_SIZE);
    }

    let reopened = DatabaseStorage::open(&path)?;
    let all = reopened.list_mods(&ModFilter::default()).await?;
    assert_eq!(all.total, FALLBACK_SIZE);
    assert!(all.data.iter().all(|m| m.source == "CurseForge"));

    // Versions are reference data and survive a reload
    assert_eq!(reopened.get_minecraft_versions().await?.len(), 8);
    let names: Vec<String> = reopened
        .get_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(!names.contains(&"Quality of Life".to_string()));
    Ok(())
}

#[tokio::test]
async fn repeated_ingestion_never_duplicates_categories() -> Result<()> {
    let store: Arc<dyn Storage> = Arc::new(DatabaseStorage::open_in_memory()?);
    let writer = IngestionWriter::new(store.clone());
    let sources = vec![curseforge_without_key()];

    let first = writer.ingest(&aggregate(&sources, 10).await).await;
    let second = writer.ingest(&aggregate(&sources, 10).await).await;

    assert!(first.saved_categories() > 0);
    assert_eq!(second.saved_categories(), 0);
    assert_eq!(second.categories.parsed, first.categories.parsed);
    assert_eq!(store.get_categories().await?.len(), first.saved_categories());
    assert_eq!(
        store.list_mods(&ModFilter::default()).await?.total,
        2 * FALLBACK_SIZE
    );
    Ok(())
}

#[tokio::test]
async fn fallback_catalog_is_browsable() -> Result<()> {
    let store: Arc<dyn Storage> = Arc::new(DatabaseStorage::open_in_memory()?);
    let batch = curseforge_without_key().fetch(10).await;
    IngestionWriter::new(store.clone()).ingest(&batch).await;

    let top = store
        .list_mods(&ModFilter::first_page(SortBy::Popular, 3))
        .await?;
    assert_eq!(top.data[0].name, "Quark");
    assert_eq!(top.page_count, FALLBACK_SIZE.div_ceil(3));

    let quark = ModFilter {
        search: Some("quark".into()),
        ..ModFilter::default()
    };
    let hits = store.list_mods(&quark).await?;
    assert!(hits.total >= 1);
    assert!(hits
        .data
        .iter()
        .all(|m| m.name.to_lowercase().contains("quark")));
    Ok(())
}
