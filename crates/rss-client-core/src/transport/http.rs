//! HTTP endpoint over reqwest

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::ServerTransport;
use crate::error::{Error, Result};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A remote server endpoint
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    base_url: String,
    client: Client,
}

impl HttpEndpoint {
    /// Create an endpoint for a base URL
    pub fn new(url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ServerTransport for HttpEndpoint {
    async fn get(&self, path: &str) -> Result<Value> {
        self.client
            .get(self.url_for(path))
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.client
            .post(self.url_for(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
