use super::Storage;
use crate::error::{Result, StorageError};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS mods (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        name           TEXT NOT NULL,
        description    TEXT NOT NULL,
        version        TEXT NOT NULL,
        category       TEXT NOT NULL,
        download_count INTEGER NOT NULL DEFAULT 0,
        image_url      TEXT NOT NULL,
        download_url   TEXT NOT NULL,
        source_url     TEXT NOT NULL,
        source         TEXT NOT NULL DEFAULT 'unknown',
        is_new         INTEGER NOT NULL DEFAULT 0,
        created_at     INTEGER NOT NULL,
        -- Lowercased in Rust, since SQLite lower() only folds ASCII
        name_folded        TEXT NOT NULL DEFAULT '',
        description_folded TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS categories (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        name      TEXT NOT NULL UNIQUE,
        image_url TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS minecraft_versions (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        version TEXT NOT NULL UNIQUE
    );
"#;

const MOD_COLUMNS: &str = "id, name, description, version, category, download_count, \
     image_url, download_url, source_url, source, is_new, created_at";

/// Relational catalog store backed by SQLite.
///
/// `AUTOINCREMENT` keeps ids from being reused after a clear, matching the
/// in-memory store.
pub struct DatabaseStorage {
    conn: Mutex<Connection>,
}

impl DatabaseStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened catalog database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn select_mod(conn: &Connection, id: i64) -> Result<Option<Mod>> {
        let row = conn
            .query_row(
                &format!("SELECT {MOD_COLUMNS} FROM mods WHERE id = ?1"),
                params![id],
                ModRow::from_row,
            )
            .optional()?;
        row.map(Mod::try_from).transpose()
    }
}

/// Raw column values before timestamp and counter conversion
struct ModRow {
    id: i64,
    name: String,
    description: String,
    version: String,
    category: String,
    download_count: i64,
    image_url: String,
    download_url: String,
    source_url: String,
    source: String,
    is_new: bool,
    created_at_micros: i64,
}

impl ModRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            version: row.get(3)?,
            category: row.get(4)?,
            download_count: row.get(5)?,
            image_url: row.get(6)?,
            download_url: row.get(7)?,
            source_url: row.get(8)?,
            source: row.get(9)?,
            is_new: row.get(10)?,
            created_at_micros: row.get(11)?,
        })
    }
}

impl TryFrom<ModRow> for Mod {
    type Error = StorageError;

    fn try_from(row: ModRow) -> Result<Self> {
        let created_at: DateTime<Utc> = DateTime::from_timestamp_micros(row.created_at_micros)
            .ok_or_else(|| StorageError::CorruptRow {
                message: format!("mod {} has invalid created_at", row.id),
            })?;
        let download_count =
            u64::try_from(row.download_count).map_err(|_| StorageError::CorruptRow {
                message: format!("mod {} has negative download_count", row.id),
            })?;
        Ok(Mod {
            id: row.id,
            name: row.name,
            description: row.description,
            version: row.version,
            category: row.category,
            download_count,
            image_url: row.image_url,
            download_url: row.download_url,
            source_url: row.source_url,
            source: row.source,
            is_new: row.is_new,
            created_at,
        })
    }
}

/// Unique-constraint failures become conflicts; everything else stays a database error
fn insert_error(entity: &'static str, value: &str, err: rusqlite::Error) -> StorageError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            StorageError::Conflict {
                entity,
                value: value.to_string(),
            }
        }
        _ => StorageError::Database(err),
    }
}

/// WHERE clause and bound values for a filter
fn where_clause(filter: &ModFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(term) = filter.search_term() {
        conditions.push("(instr(name_folded, ?) > 0 OR instr(description_folded, ?) > 0)");
        values.push(Value::Text(term.clone()));
        values.push(Value::Text(term));
    }
    if let Some(version) = filter.version_filter() {
        conditions.push("version = ?");
        values.push(Value::Text(version.to_string()));
    }
    if let Some(category) = filter.category_filter() {
        conditions.push("category = ?");
        values.push(Value::Text(category.to_string()));
    }
    if let Some(source) = filter.source_filter() {
        conditions.push("source = ?");
        values.push(Value::Text(source.to_string()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}

fn order_clause(sort_by: Option<SortBy>) -> &'static str {
    match sort_by {
        Some(SortBy::Recent) => " ORDER BY created_at DESC, id DESC",
        Some(SortBy::Name) => " ORDER BY name ASC, id ASC",
        Some(SortBy::Popular) | Some(SortBy::Downloads) | None => {
            " ORDER BY download_count DESC, id ASC"
        }
    }
}

fn to_sql_int(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let user = conn
            .query_row(
                "SELECT id, username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![user.username, user.password_hash],
        )
        .map_err(|e| insert_error("user", &user.username, e))?;
        let id = conn.last_insert_rowid();

        debug!("Created user: {} with id {}", user.username, id);
        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
        })
    }

    async fn get_mod(&self, id: i64) -> Result<Option<Mod>> {
        let conn = self.conn();
        Self::select_mod(&conn, id)
    }

    async fn list_mods(&self, filter: &ModFilter) -> Result<Paginated<Mod>> {
        let (where_sql, values) = where_clause(filter);
        let conn = self.conn();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM mods{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let mut page_values = values;
        page_values.push(Value::Integer(to_sql_int(filter.effective_page_size())));
        page_values.push(Value::Integer(to_sql_int(filter.offset())));

        let sql = format!(
            "SELECT {MOD_COLUMNS} FROM mods{where_sql}{} LIMIT ? OFFSET ?",
            order_clause(filter.sort_by)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(page_values.iter()), ModRow::from_row)?;

        let mut data = Vec::new();
        for row in rows {
            data.push(Mod::try_from(row?)?);
        }

        Ok(Paginated::new(data, usize::try_from(total).unwrap_or(0), filter))
    }

    async fn create_mod(&self, new_mod: NewMod) -> Result<Mod> {
        let conn = self.conn();
        // Ids come from the table, so build the row with a placeholder first
        let pending = new_mod.into_mod(0, now_timestamp());
        conn.execute(
            "INSERT INTO mods (name, description, version, category, download_count, image_url, \
             download_url, source_url, source, is_new, created_at, name_folded, \
             description_folded) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                pending.name,
                pending.description,
                pending.version,
                pending.category,
                i64::try_from(pending.download_count).unwrap_or(i64::MAX),
                pending.image_url,
                pending.download_url,
                pending.source_url,
                pending.source,
                pending.is_new,
                pending.created_at.timestamp_micros(),
                pending.name.to_lowercase(),
                pending.description.to_lowercase(),
            ],
        )?;
        let created = Mod {
            id: conn.last_insert_rowid(),
            ..pending
        };

        debug!("Created mod: {} with id {}", created.name, created.id);
        Ok(created)
    }

    async fn increment_download_count(&self, id: i64) -> Result<Option<Mod>> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE mods SET download_count = download_count + 1 WHERE id = ?1",
            params![id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        Self::select_mod(&conn, id)
    }

    async fn clear_mods(&self) -> Result<()> {
        let conn = self.conn();
        let removed = conn.execute("DELETE FROM mods", [])?;
        debug!("Cleared {} mods", removed);
        Ok(())
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, image_url FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                image_url: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn();
        let category = conn
            .query_row(
                "SELECT id, name, image_url FROM categories WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        image_url: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let conn = self.conn();
        let category = conn
            .query_row(
                "SELECT id, name, image_url FROM categories WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        image_url: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO categories (name, image_url) VALUES (?1, ?2)",
            params![category.name, category.image_url],
        )
        .map_err(|e| insert_error("category", &category.name, e))?;
        let id = conn.last_insert_rowid();

        debug!("Created category: {} with id {}", category.name, id);
        Ok(Category {
            id,
            name: category.name,
            image_url: category.image_url,
        })
    }

    async fn clear_categories(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM categories", [])?;
        Ok(())
    }

    async fn get_minecraft_versions(&self) -> Result<Vec<MinecraftVersion>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, version FROM minecraft_versions ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(MinecraftVersion {
                id: row.get(0)?,
                version: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn create_minecraft_version(
        &self,
        version: NewMinecraftVersion,
    ) -> Result<MinecraftVersion> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO minecraft_versions (version) VALUES (?1)",
            params![version.version],
        )
        .map_err(|e| insert_error("minecraft version", &version.version, e))?;
        Ok(MinecraftVersion {
            id: conn.last_insert_rowid(),
            version: version.version,
        })
    }
}
