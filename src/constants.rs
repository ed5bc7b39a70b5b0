/// Provenance labels stored on every ingested mod
pub const CURSEFORGE_SOURCE: &str = "CurseForge";
pub const MODRINTH_SOURCE: &str = "Modrinth";
pub const UNKNOWN_SOURCE: &str = "unknown";

// Provider endpoints
pub const CURSEFORGE_SEARCH_URL: &str = "https://api.curseforge.com/v1/mods/search";
pub const CURSEFORGE_MOD_PAGE: &str = "https://www.curseforge.com/minecraft/mc-mods";
pub const MODRINTH_SEARCH_URL: &str = "https://api.modrinth.com/v2/search";
pub const MODRINTH_MOD_PAGE: &str = "https://modrinth.com/mod";

pub const CURSEFORGE_MINECRAFT_GAME_ID: u32 = 432;
pub const CURSEFORGE_MODS_CLASS_ID: u32 = 6;
/// Sort field 2 is popularity in the CurseForge search API
pub const CURSEFORGE_SORT_POPULARITY: u32 = 2;
pub const CURSEFORGE_MAX_PAGE_SIZE: usize = 50;

/// Modrinth caps search hits per request
pub const MODRINTH_PAGE_SIZE: usize = 20;
pub const MODRINTH_MAX_PAGES: usize = 100;

pub const USER_AGENT: &str = "ModVoyage/1.0";

/// Mod loaders show up as tags but never name a category
pub const MOD_LOADERS: [&str; 4] = ["forge", "fabric", "quilt", "liteloader"];

pub const DEFAULT_CATEGORY: &str = "Utility";
pub const DEFAULT_GAME_VERSION: &str = "1.20.1";

/// A mod counts as new when created within this many days
pub const NEW_MOD_WINDOW_DAYS: i64 = 30;

pub const MOD_IMAGE_PLACEHOLDER: &str = "https://placehold.co/400x200/333333/FFFFFF.png";
pub const FALLBACK_IMAGE_PLACEHOLDER: &str = "https://placehold.co/400x300/333333/FFFFFF.png";
pub const CATEGORY_IMAGE_PLACEHOLDER: &str = "https://placehold.co/200x150/333333/FFFFFF.png";

// Catalog query defaults
pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SHOWCASE_LIMIT: usize = 4;

/// Filter values meaning "do not filter on this dimension"
pub const FILTER_SENTINELS: [&str; 4] = ["all", "all versions", "all categories", "all sources"];

// Default `limit` for each parse endpoint
pub const PARSE_DEFAULT_LIMIT: usize = 10;
pub const PARSE_PAGE_DEFAULT_LIMIT: usize = 20;
pub const AUTO_INGEST_LIMIT: usize = 20;

/// Whether a filter value selects every row
pub fn is_filter_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || FILTER_SENTINELS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(value))
}
