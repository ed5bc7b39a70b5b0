//! Starter catalog content for a fresh store.

use super::Storage;
use crate::constants::{CURSEFORGE_MOD_PAGE, CURSEFORGE_SOURCE, MODRINTH_MOD_PAGE, MODRINTH_SOURCE};
use crate::error::Result;
use crate::types::{NewCategory, NewMinecraftVersion, NewMod};
use tracing::info;

pub const SAMPLE_VERSIONS: [&str; 8] = [
    "1.20.1", "1.19.2", "1.18.2", "1.17.1", "1.16.5", "1.15.2", "1.14.4", "1.12.2",
];

const SAMPLE_CATEGORIES: [(&str, &str); 15] = [
    ("Technology", "https://i.imgur.com/sFBc8RC.jpg"),
    ("Magic", "https://i.imgur.com/wPD9Tza.jpg"),
    ("Adventure", "https://i.imgur.com/PqaI5HO.jpg"),
    ("World Generation", "https://i.imgur.com/4Rmmfzu.jpg"),
    ("Utility", "https://i.imgur.com/J3lMPOw.jpg"),
    ("Quality of Life", "https://i.imgur.com/wUMR6Ea.jpg"),
    ("Storage", "https://i.imgur.com/BPzjvJp.jpg"),
    ("API/Library", "https://i.imgur.com/IFVnrfS.jpg"),
    ("Tools", "https://i.imgur.com/nqWLwEj.jpg"),
    ("Building", "https://i.imgur.com/nUc2fMG.jpg"),
    ("Mobs", "https://i.imgur.com/MU3sP22.jpg"),
    ("Dimension", "https://i.imgur.com/YGhrSyF.jpg"),
    ("Transportation", "https://i.imgur.com/QdBBG3b.jpg"),
    ("Food", "https://i.imgur.com/uoGW5st.jpg"),
    ("Library", "https://i.imgur.com/GAbHnT9.jpg"),
];

struct SampleMod {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    version: &'static str,
    category: &'static str,
    downloads: u64,
    source: &'static str,
    is_new: bool,
}

const SAMPLE_MODS: [SampleMod; 8] = [
    SampleMod {
        name: "Applied Energistics 2",
        slug: "applied-energistics-2",
        description: "A mod about matter, energy and using them to conquer the world.",
        version: "1.20.1",
        category: "Technology",
        downloads: 25_600_000,
        source: CURSEFORGE_SOURCE,
        is_new: false,
    },
    SampleMod {
        name: "Just Enough Items",
        slug: "jei",
        description: "View items and recipes for all installed mods in an easy-to-use interface.",
        version: "1.20.1",
        category: "Utility",
        downloads: 42_300_000,
        source: CURSEFORGE_SOURCE,
        is_new: false,
    },
    SampleMod {
        name: "Create",
        slug: "create",
        description: "A steampunk technology mod focused on rotational power and aesthetics.",
        version: "1.19.2",
        category: "Technology",
        downloads: 18_700_000,
        source: CURSEFORGE_SOURCE,
        is_new: false,
    },
    SampleMod {
        name: "Botania",
        slug: "botania",
        description: "A tech mod themed around natural magic and flowers.",
        version: "1.20.1",
        category: "Magic",
        downloads: 15_900_000,
        source: CURSEFORGE_SOURCE,
        is_new: false,
    },
    SampleMod {
        name: "More Structures+",
        slug: "more-structures-plus",
        description: "Adds 50+ new structures to make exploration more exciting.",
        version: "1.20.1",
        category: "World Generation",
        downloads: 156_000,
        source: CURSEFORGE_SOURCE,
        is_new: true,
    },
    SampleMod {
        name: "Enchanted Combat",
        slug: "enchanted-combat",
        description: "Revamps the combat system with magic spells and new weapons.",
        version: "1.20.1",
        category: "Adventure",
        downloads: 89_000,
        source: CURSEFORGE_SOURCE,
        is_new: true,
    },
    SampleMod {
        name: "Biome Tweaker",
        slug: "biome-tweaker",
        description: "Customize Minecraft biomes with new flora, fauna, and terrain generation.",
        version: "1.20.1",
        category: "World Generation",
        downloads: 63_000,
        source: MODRINTH_SOURCE,
        is_new: true,
    },
    SampleMod {
        name: "Simple Storage",
        slug: "simple-storage",
        description: "A lightweight storage solution for organizing your items.",
        version: "1.19.2",
        category: "Storage",
        downloads: 42_000,
        source: MODRINTH_SOURCE,
        is_new: true,
    },
];

impl SampleMod {
    fn mod_page(&self) -> &'static str {
        if self.source == MODRINTH_SOURCE {
            MODRINTH_MOD_PAGE
        } else {
            CURSEFORGE_MOD_PAGE
        }
    }

    fn to_new_mod(&self) -> NewMod {
        NewMod {
            name: self.name.to_string(),
            description: self.description.to_string(),
            version: self.version.to_string(),
            category: self.category.to_string(),
            download_count: Some(self.downloads),
            image_url: format!(
                "https://via.placeholder.com/400x200?text={}",
                self.name.replace(' ', "+")
            ),
            download_url: format!("/download/{}", self.slug),
            source_url: format!("{}/{}", self.mod_page(), self.slug),
            source: Some(self.source.to_string()),
            is_new: Some(self.is_new),
        }
    }
}

/// Seed each table that is still empty. Returns true if anything was written.
pub async fn seed_if_empty(store: &dyn Storage) -> Result<bool> {
    let mut seeded = false;

    if store.get_minecraft_versions().await?.is_empty() {
        for version in SAMPLE_VERSIONS {
            store
                .create_minecraft_version(NewMinecraftVersion {
                    version: version.to_string(),
                })
                .await?;
        }
        seeded = true;
    }

    if store.get_categories().await?.is_empty() {
        for (name, image_url) in SAMPLE_CATEGORIES {
            store
                .create_category(NewCategory {
                    name: name.to_string(),
                    image_url: image_url.to_string(),
                })
                .await?;
        }
        seeded = true;
    }

    let any_mods = !store.get_popular_mods(1).await?.is_empty();
    if !any_mods {
        for sample in &SAMPLE_MODS {
            store.create_mod(sample.to_new_mod()).await?;
        }
        seeded = true;
    }

    if seeded {
        info!("Seeded sample catalog data");
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = InMemoryStorage::new();
        assert!(seed_if_empty(&store).await.unwrap());
        assert!(!seed_if_empty(&store).await.unwrap());

        assert_eq!(store.get_minecraft_versions().await.unwrap().len(), 8);
        assert_eq!(store.get_categories().await.unwrap().len(), 15);
        let popular = store.get_popular_mods(1).await.unwrap();
        assert_eq!(popular[0].name, "Just Enough Items");
    }
}
