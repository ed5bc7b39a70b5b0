pub mod database;
pub mod in_memory;
pub mod query;
pub mod seed;

pub use database::DatabaseStorage;
pub use in_memory::InMemoryStorage;

use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;

/// Catalog persistence. Both implementations must answer every query identically.
#[async_trait]
pub trait Storage: Send + Sync {
    // User operations
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> Result<User>;

    // Mod operations
    async fn get_mod(&self, id: i64) -> Result<Option<Mod>>;
    async fn list_mods(&self, filter: &ModFilter) -> Result<Paginated<Mod>>;
    async fn create_mod(&self, new_mod: NewMod) -> Result<Mod>;
    /// Adds exactly one download; `None` when the mod does not exist
    async fn increment_download_count(&self, id: i64) -> Result<Option<Mod>>;
    async fn clear_mods(&self) -> Result<()>;

    async fn get_popular_mods(&self, limit: usize) -> Result<Vec<Mod>> {
        let page = self
            .list_mods(&ModFilter::first_page(SortBy::Popular, limit))
            .await?;
        Ok(page.data)
    }

    async fn get_latest_mods(&self, limit: usize) -> Result<Vec<Mod>> {
        let page = self
            .list_mods(&ModFilter::first_page(SortBy::Recent, limit))
            .await?;
        Ok(page.data)
    }

    // Category operations
    async fn get_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn create_category(&self, category: NewCategory) -> Result<Category>;
    async fn clear_categories(&self) -> Result<()>;

    // Minecraft version operations
    async fn get_minecraft_versions(&self) -> Result<Vec<MinecraftVersion>>;
    async fn create_minecraft_version(&self, version: NewMinecraftVersion)
        -> Result<MinecraftVersion>;
}
