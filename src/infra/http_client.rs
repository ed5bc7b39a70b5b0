use crate::app::ports::{HttpClientPort, JsonRequest};
use crate::constants::USER_AGENT;
use crate::error::SourceError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT as USER_AGENT_HEADER};
use serde_json::Value;
use std::time::Duration;

/// `reqwest`-backed client with a per-request timeout
pub struct ReqwestHttp {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get_json(&self, request: &JsonRequest) -> Result<Value, SourceError> {
        let mut builder = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .header(ACCEPT, "application/json");
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let send = async {
            let resp = builder.send().await?.error_for_status()?;
            resp.json::<Value>().await
        };
        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SourceError::Timeout(self.timeout.as_secs())),
        }
    }
}
