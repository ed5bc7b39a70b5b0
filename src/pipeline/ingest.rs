use super::aggregate::aggregate;
use crate::apis::{ModSource, SourceBatch};
use crate::error::Result;
use crate::metrics::IngestMetrics;
use crate::storage::Storage;
use crate::types::{Category, Mod, NewCategory, NewMod};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Mods written by one run over a list of parsed entries
#[derive(Debug, Clone, Serialize)]
pub struct ModReport {
    pub parsed: usize,
    pub saved: usize,
    pub mods: Vec<Mod>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub parsed: usize,
    pub saved: usize,
    pub items: Vec<Category>,
}

/// Outcome of persisting one batch. Counts are rows actually written.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    #[serde(flatten)]
    pub mods: ModReport,
    pub categories: CategoryReport,
}

impl IngestReport {
    pub fn saved_mods(&self) -> usize {
        self.mods.saved
    }

    pub fn saved_categories(&self) -> usize {
        self.categories.saved
    }
}

/// Persists adapter output into a catalog store, one row at a time
pub struct IngestionWriter {
    store: Arc<dyn Storage>,
}

impl IngestionWriter {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Create categories whose name is not yet stored. Returns only the ones created.
    pub async fn save_categories(&self, categories: &[NewCategory]) -> Vec<Category> {
        let mut saved = Vec::new();
        for category in categories {
            match self.store.get_category_by_name(&category.name).await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => {
                    warn!("Failed to look up category {}: {}", category.name, e);
                    IngestMetrics::record_item_error("category");
                    continue;
                }
            }
            match self.store.create_category(category.clone()).await {
                Ok(created) => saved.push(created),
                Err(e) => {
                    warn!("Failed to save category {}: {}", category.name, e);
                    IngestMetrics::record_item_error("category");
                }
            }
        }
        IngestMetrics::record_saved("category", saved.len());
        saved
    }

    /// Create every mod; a failing row is logged and skipped
    pub async fn save_mods(&self, mods: &[NewMod]) -> Vec<Mod> {
        let mut saved = Vec::with_capacity(mods.len());
        for new_mod in mods {
            match self.store.create_mod(new_mod.clone()).await {
                Ok(created) => saved.push(created),
                Err(e) => {
                    warn!("Failed to save mod {}: {}", new_mod.name, e);
                    IngestMetrics::record_item_error("mod");
                }
            }
        }
        IngestMetrics::record_saved("mod", saved.len());
        saved
    }

    /// Mods only, for sources whose categories are not stored
    pub async fn ingest_mods(&self, mods: &[NewMod]) -> ModReport {
        let saved = self.save_mods(mods).await;
        ModReport {
            parsed: mods.len(),
            saved: saved.len(),
            mods: saved,
        }
    }

    pub async fn ingest(&self, batch: &SourceBatch) -> IngestReport {
        let items = self.save_categories(&batch.categories).await;
        let mods = self.ingest_mods(&batch.mods).await;
        let report = IngestReport {
            mods,
            categories: CategoryReport {
                parsed: batch.categories.len(),
                saved: items.len(),
                items,
            },
        };
        info!(
            "Ingested {}/{} mods and {}/{} categories",
            report.mods.saved, report.mods.parsed, report.categories.saved, report.categories.parsed
        );
        report
    }

    /// Replace the catalog's mods and categories with `batch`
    pub async fn reload(&self, batch: &SourceBatch) -> Result<IngestReport> {
        self.store.clear_mods().await?;
        self.store.clear_categories().await?;
        Ok(self.ingest(batch).await)
    }
}

/// Refresh the catalog from every source at process start
pub async fn auto_ingest(
    store: Arc<dyn Storage>,
    sources: &[Arc<dyn ModSource>],
    limit: usize,
) -> Result<IngestReport> {
    info!("Starting automatic ingestion from {} sources", sources.len());
    let batch = aggregate(sources, limit).await;
    let report = IngestionWriter::new(store).reload(&batch).await?;
    info!("Automatic ingestion completed");
    Ok(report)
}
