use crate::apis::{ModSource, SourceBatch};
use crate::metrics::IngestMetrics;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Run every source concurrently and merge what each produced.
///
/// Mods keep source order. Categories are deduped by name, first occurrence
/// wins. A source whose task dies contributes nothing.
pub async fn aggregate(sources: &[Arc<dyn ModSource>], limit: usize) -> SourceBatch {
    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            let name = source.name();
            (name, tokio::spawn(async move { source.fetch(limit).await }))
        })
        .collect();

    let mut merged = SourceBatch::default();
    let mut seen = HashSet::new();
    for (name, handle) in handles {
        match handle.await {
            Ok(batch) => {
                info!("{} returned {} mods", name, batch.mods.len());
                IngestMetrics::record_source_batch(name, batch.mods.len());
                merged.mods.extend(batch.mods);
                merged.categories.extend(
                    batch
                        .categories
                        .into_iter()
                        .filter(|c| seen.insert(c.name.clone())),
                );
            }
            Err(e) => {
                error!("{} task failed: {}", name, e);
                IngestMetrics::record_source_failure();
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewCategory, NewMod};
    use async_trait::async_trait;

    struct Fixed {
        name: &'static str,
        mods: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl ModSource for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self, _limit: usize) -> SourceBatch {
            let mods = self
                .mods
                .iter()
                .map(|(name, category)| NewMod {
                    name: name.to_string(),
                    description: String::new(),
                    version: "1.20.1".into(),
                    category: category.to_string(),
                    download_count: None,
                    image_url: String::new(),
                    download_url: String::new(),
                    source_url: String::new(),
                    source: Some(self.name.to_string()),
                    is_new: None,
                })
                .collect();
            SourceBatch::from_mods(mods)
        }
    }

    struct Exploding;

    #[async_trait]
    impl ModSource for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        async fn fetch(&self, _limit: usize) -> SourceBatch {
            panic!("provider exploded");
        }
    }

    #[tokio::test]
    async fn merges_in_source_order_and_dedupes_categories() {
        let sources: Vec<Arc<dyn ModSource>> = vec![
            Arc::new(Fixed {
                name: "A",
                mods: vec![("a1", "Magic"), ("a2", "Storage")],
            }),
            Arc::new(Fixed {
                name: "B",
                mods: vec![("b1", "Magic"), ("b2", "Technology")],
            }),
        ];
        let merged = aggregate(&sources, 10).await;

        let names: Vec<&str> = merged.mods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a1", "a2", "b1", "b2"]);
        let cats: Vec<&NewCategory> = merged.categories.iter().collect();
        assert_eq!(cats.len(), 3);
        assert_eq!(cats[0].name, "Magic");
        assert_eq!(cats[2].name, "Technology");
    }

    #[tokio::test]
    async fn a_dying_source_does_not_affect_siblings() {
        let sources: Vec<Arc<dyn ModSource>> = vec![
            Arc::new(Exploding),
            Arc::new(Fixed {
                name: "B",
                mods: vec![("b1", "Food")],
            }),
        ];
        let merged = aggregate(&sources, 10).await;
        assert_eq!(merged.mods.len(), 1);
        assert_eq!(merged.mods[0].name, "b1");
    }
}
