use thiserror::Error;

/// Failures raised by a catalog store implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{entity} already exists: {value}")]
    Conflict { entity: &'static str, value: String },

    #[error("Corrupt row: {message}")]
    CorruptRow { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to an external mod provider. Never escape an adapter.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;
