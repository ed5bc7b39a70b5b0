use crate::constants::AUTO_INGEST_LIMIT;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH: &str = "modvoyage.toml";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sources: SourcesConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "data/modvoyage.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub curseforge_api_key: Option<String>,
    pub modrinth_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub modrinth_page_delay_ms: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            curseforge_api_key: None,
            modrinth_api_key: None,
            request_timeout_secs: 15,
            modrinth_page_delay_ms: 300,
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn modrinth_page_delay(&self) -> Duration {
        Duration::from_millis(self.modrinth_page_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub auto_ingest_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            auto_ingest_limit: AUTO_INGEST_LIMIT,
        }
    }
}

impl Config {
    /// `.env`, then `modvoyage.toml` if present, then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let mut config = Self::from_file(CONFIG_PATH)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Defaults when the file does not exist
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("CURSEFORGE_API_KEY") {
            self.sources.curseforge_api_key = Some(key);
        }
        if let Some(key) = lookup("MODRINTH_API_KEY") {
            self.sources.modrinth_api_key = Some(key);
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            self.storage.database_path = path;
        }
        if let Some(port) = lookup("MODVOYAGE_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MODVOYAGE_PORT",
                value: port,
            })?;
        }
        Ok(())
    }
}
