use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::Value;

/// One outbound JSON GET against a provider API
#[derive(Clone, Debug, Default)]
pub struct JsonRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl JsonRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// Ingest-side port
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get_json(&self, request: &JsonRequest) -> Result<Value, SourceError>;
}
