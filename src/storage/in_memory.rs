use super::query;
use super::Storage;
use crate::error::{Result, StorageError};
use crate::types::*;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Rows keyed by id plus the next id to hand out. Ids are never reused.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock<T>(table: &Mutex<T>) -> MutexGuard<'_, T> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-memory catalog store
pub struct InMemoryStorage {
    users: Arc<Mutex<Table<User>>>,
    mods: Arc<Mutex<Table<Mod>>>,
    categories: Arc<Mutex<Table<Category>>>,
    versions: Arc<Mutex<Table<MinecraftVersion>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(Table::new())),
            mods: Arc::new(Mutex::new(Table::new())),
            categories: Arc::new(Mutex::new(Table::new())),
            versions: Arc::new(Mutex::new(Table::new())),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(lock(&self.users).rows.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = lock(&self.users);
        Ok(users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = lock(&self.users);
        if users.rows.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict {
                entity: "user",
                value: user.username,
            });
        }
        let id = users.allocate_id();
        let user = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
        };
        users.rows.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.username, id);
        Ok(user)
    }

    async fn get_mod(&self, id: i64) -> Result<Option<Mod>> {
        Ok(lock(&self.mods).rows.get(&id).cloned())
    }

    async fn list_mods(&self, filter: &ModFilter) -> Result<Paginated<Mod>> {
        let mods = lock(&self.mods);
        Ok(query::paginate(mods.rows.values(), filter))
    }

    async fn create_mod(&self, new_mod: NewMod) -> Result<Mod> {
        let mut mods = lock(&self.mods);
        let id = mods.allocate_id();
        let created = new_mod.into_mod(id, now_timestamp());
        mods.rows.insert(id, created.clone());

        debug!("Created mod: {} with id {}", created.name, id);
        Ok(created)
    }

    async fn increment_download_count(&self, id: i64) -> Result<Option<Mod>> {
        let mut mods = lock(&self.mods);
        Ok(mods.rows.get_mut(&id).map(|m| {
            m.download_count += 1;
            m.clone()
        }))
    }

    async fn clear_mods(&self) -> Result<()> {
        lock(&self.mods).rows.clear();
        Ok(())
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        Ok(lock(&self.categories).rows.values().cloned().collect())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(lock(&self.categories).rows.get(&id).cloned())
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let categories = lock(&self.categories);
        Ok(categories
            .rows
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let mut categories = lock(&self.categories);
        if categories.rows.values().any(|c| c.name == category.name) {
            return Err(StorageError::Conflict {
                entity: "category",
                value: category.name,
            });
        }
        let id = categories.allocate_id();
        let category = Category {
            id,
            name: category.name,
            image_url: category.image_url,
        };
        categories.rows.insert(id, category.clone());

        debug!("Created category: {} with id {}", category.name, id);
        Ok(category)
    }

    async fn clear_categories(&self) -> Result<()> {
        lock(&self.categories).rows.clear();
        Ok(())
    }

    async fn get_minecraft_versions(&self) -> Result<Vec<MinecraftVersion>> {
        Ok(lock(&self.versions).rows.values().cloned().collect())
    }

    async fn create_minecraft_version(
        &self,
        version: NewMinecraftVersion,
    ) -> Result<MinecraftVersion> {
        let mut versions = lock(&self.versions);
        if versions.rows.values().any(|v| v.version == version.version) {
            return Err(StorageError::Conflict {
                entity: "minecraft version",
                value: version.version,
            });
        }
        let id = versions.allocate_id();
        let version = MinecraftVersion {
            id,
            version: version.version,
        };
        versions.rows.insert(id, version.clone());
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str) -> NewMod {
        NewMod {
            name: name.to_string(),
            description: "desc".into(),
            version: "1.20.1".into(),
            category: "Magic".into(),
            download_count: Some(3),
            image_url: String::new(),
            download_url: String::new(),
            source_url: format!("https://example.com/{name}"),
            source: Some("Modrinth".into()),
            is_new: Some(true),
        }
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_clear() {
        let store = InMemoryStorage::new();
        let first = store.create_mod(sample("a")).await.unwrap();
        store.clear_mods().await.unwrap();
        let second = store.create_mod(sample("b")).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(store.get_mod(first.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryStorage::new());
        let created = store.create_mod(sample("a")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_download_count(created.id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let after = store.get_mod(created.id).await.unwrap().unwrap();
        assert_eq!(after.download_count, 53);
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let store = InMemoryStorage::new();
        let cat = NewCategory {
            name: "Magic".into(),
            image_url: "x".into(),
        };
        store.create_category(cat.clone()).await.unwrap();
        let err = store.create_category(cat).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        assert_eq!(store.get_categories().await.unwrap().len(), 1);
    }
}
