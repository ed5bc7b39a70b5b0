//! Synthetic catalog used when a provider cannot be reached.
//!
//! Output depends only on the profile's seed, so tests and offline demos see
//! the same catalog every time.

use super::{placeholder_image, slugify, SourceBatch};
use crate::constants::*;
use crate::types::NewMod;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which provider the synthetic mods pretend to come from
#[derive(Debug, Clone, Copy)]
pub struct FallbackProfile {
    pub source: &'static str,
    pub mod_page_base: &'static str,
    pub seed: u64,
}

pub const CURSEFORGE_PROFILE: FallbackProfile = FallbackProfile {
    source: CURSEFORGE_SOURCE,
    mod_page_base: CURSEFORGE_MOD_PAGE,
    seed: 0x00C0_FFEE,
};

pub const MODRINTH_PROFILE: FallbackProfile = FallbackProfile {
    source: MODRINTH_SOURCE,
    mod_page_base: MODRINTH_MOD_PAGE,
    seed: 0x000D_1CE5,
};

struct PoolMod {
    name: &'static str,
    description: &'static str,
    category: &'static str,
    image_text: &'static str,
    downloads: u64,
}

const POOL: [PoolMod; 10] = [
    PoolMod {
        name: "Quark",
        description: "A modular mod focused on improving the vanilla gameplay experience",
        category: "Utility",
        image_text: "Quark",
        downloads: 32_500_000,
    },
    PoolMod {
        name: "JourneyMap",
        description: "Real-time mapping in-game or your browser as you explore",
        category: "Utility",
        image_text: "JourneyMap",
        downloads: 28_700_000,
    },
    PoolMod {
        name: "Biomes O' Plenty",
        description: "Adds over 90 new biomes to Minecraft",
        category: "World Generation",
        image_text: "Biomes O' Plenty",
        downloads: 25_100_000,
    },
    PoolMod {
        name: "Waystones",
        description: "Teleportation items that allow players to return to previously visited areas",
        category: "Transportation",
        image_text: "Waystones",
        downloads: 18_300_000,
    },
    PoolMod {
        name: "Storage Drawers",
        description: "Multi-block storage solution that allows for compact item storage",
        category: "Storage",
        image_text: "Storage Drawers",
        downloads: 17_600_000,
    },
    PoolMod {
        name: "Sophisticated Backpacks",
        description: "Advanced backpacks with upgrade system and automation features",
        category: "Storage",
        image_text: "Sophisticated Backpacks",
        downloads: 12_400_000,
    },
    PoolMod {
        name: "Nature's Compass",
        description: "Helps you locate specific biomes using a compass",
        category: "Utility",
        image_text: "Nature's Compass",
        downloads: 11_500_000,
    },
    PoolMod {
        name: "Chisel",
        description: "Adds a huge variety of decorative blocks",
        category: "Building",
        image_text: "Chisel",
        downloads: 16_800_000,
    },
    PoolMod {
        name: "Better Villages",
        description: "Redesigned villages with improved structure generation",
        category: "World Generation",
        image_text: "Better Villages",
        downloads: 9_700_000,
    },
    PoolMod {
        name: "Dungeon Crawl",
        description: "Generates massive, multi-level dungeons",
        category: "Adventure",
        image_text: "Dungeon Crawl",
        downloads: 8_200_000,
    },
];

const CATEGORY_OPTIONS: [&str; 20] = [
    "Utility",
    "Technology",
    "Magic",
    "Adventure",
    "Storage",
    "Building",
    "World Generation",
    "Transportation",
    "Decoration",
    "Redstone",
    "Food",
    "Farming",
    "Mobs",
    "Armor",
    "Tools",
    "Combat",
    "Exploration",
    "Quests",
    "Multiplayer",
    "API/Library",
];

const PREFIXES: [&str; 10] = [
    "Enhanced", "Advanced", "Ultimate", "Super", "Mega", "Extreme", "Better", "Improved",
    "Superior", "Master",
];

const SUFFIXES: [&str; 10] = [
    "Plus", "Pro", "Extended", "Deluxe", "Premium", "Expanded", "XL", "Max", "Elite", "Prime",
];

const BASE_NAMES: [&str; 23] = [
    "Backpack",
    "Crafting Table",
    "Chest",
    "Furnace",
    "Ore",
    "Biome",
    "Animals",
    "Monsters",
    "Tools",
    "Armor",
    "Food",
    "Magic",
    "Tech",
    "Flight",
    "Automation",
    "Transport",
    "Dimension",
    "Villages",
    "Structures",
    "Enchantment",
    "Combat",
    "Building",
    "Decoration",
];

const VARIANT_PASSES: usize = 30;
const INVENTED_MODS: usize = 100;

/// Total number of mods `generate` produces
pub const FALLBACK_SIZE: usize = POOL.len() * (1 + VARIANT_PASSES) + INVENTED_MODS;

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn build(
    profile: &FallbackProfile,
    name: String,
    description: String,
    category: &str,
    image_url: String,
    downloads: u64,
    is_new: bool,
) -> NewMod {
    let slug = slugify(&name);
    NewMod {
        download_url: format!("/download/{slug}"),
        source_url: format!("{}/{slug}", profile.mod_page_base),
        name,
        description,
        version: DEFAULT_GAME_VERSION.to_string(),
        category: category.to_string(),
        download_count: Some(downloads),
        image_url,
        source: Some(profile.source.to_string()),
        is_new: Some(is_new),
    }
}

/// Deterministic synthetic catalog: the named pool, prefix/suffix variants of it,
/// then freshly composed mods.
pub fn generate(profile: &FallbackProfile) -> SourceBatch {
    let mut rng = StdRng::seed_from_u64(profile.seed);
    let mut mods = Vec::with_capacity(FALLBACK_SIZE);

    for entry in &POOL {
        mods.push(build(
            profile,
            entry.name.to_string(),
            entry.description.to_string(),
            entry.category,
            placeholder_image(FALLBACK_IMAGE_PLACEHOLDER, entry.image_text),
            entry.downloads,
            false,
        ));
    }

    for _ in 0..VARIANT_PASSES {
        for entry in &POOL {
            let prefix = pick(&mut rng, &PREFIXES);
            let suffix = pick(&mut rng, &SUFFIXES);
            let category = pick(&mut rng, &CATEGORY_OPTIONS);
            let scale = rng.gen_range(0.3..0.8);
            let is_new = rng.gen_bool(0.3);
            mods.push(build(
                profile,
                format!("{prefix} {} {suffix}", entry.name),
                format!(
                    "{prefix} version of {} with additional features and improvements.",
                    entry.description
                ),
                category,
                placeholder_image(FALLBACK_IMAGE_PLACEHOLDER, entry.image_text),
                (entry.downloads as f64 * scale) as u64,
                is_new,
            ));
        }
    }

    for _ in 0..INVENTED_MODS {
        let base = pick(&mut rng, &BASE_NAMES);
        let prefix = pick(&mut rng, &PREFIXES);
        let suffix = if rng.gen_bool(0.5) {
            format!(" {}", pick(&mut rng, &SUFFIXES))
        } else {
            String::new()
        };
        let category = pick(&mut rng, &CATEGORY_OPTIONS);
        let is_new = rng.gen_bool(0.3);
        let downloads = rng.gen_range(100_000..5_100_000);
        mods.push(build(
            profile,
            format!("{prefix} {base}{suffix}"),
            format!(
                "A unique {} mod that enhances {} mechanics in Minecraft.",
                category.to_lowercase(),
                base.to_lowercase()
            ),
            category,
            placeholder_image(FALLBACK_IMAGE_PLACEHOLDER, &format!("{prefix} {base}")),
            downloads,
            is_new,
        ));
    }

    SourceBatch::from_mods(mods)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate(&CURSEFORGE_PROFILE);
        let b = generate(&CURSEFORGE_PROFILE);
        assert_eq!(a, b);
        assert_eq!(a.mods.len(), FALLBACK_SIZE);
    }

    #[test]
    fn profile_sets_provenance_and_urls() {
        let batch = generate(&MODRINTH_PROFILE);
        assert!(batch.mods.iter().all(|m| m.source.as_deref() == Some("Modrinth")));
        let first = &batch.mods[0];
        assert_eq!(first.name, "Quark");
        assert_eq!(first.source_url, "https://modrinth.com/mod/quark");
        assert_eq!(first.download_url, "/download/quark");
    }

    #[test]
    fn categories_cover_every_generated_mod() {
        let batch = generate(&CURSEFORGE_PROFILE);
        for m in &batch.mods {
            assert!(batch.categories.iter().any(|c| c.name == m.category));
        }
    }
}
