//! JSON-over-HTTP source
//!
//! The gateway and the archive resolver read every upstream document
//! through [`JsonSource`], so tests can serve canned documents instead of
//! touching the network.

use async_trait::async_trait;
use gizz_common::config::HttpConfig;
use std::time::Duration;
use thiserror::Error;

/// Upstream fetch failure, classified at the gateway boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Document did not match the expected shape
    #[error("Schema error: {0}")]
    Schema(String),
}

/// Source of JSON documents keyed by URL
#[async_trait]
pub trait JsonSource: Send + Sync {
    /// Fetch and parse one document
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;
}

/// reqwest-backed source used in production
pub struct HttpJsonSource {
    http_client: reqwest::Client,
}

impl HttpJsonSource {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl JsonSource for HttpJsonSource {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        tracing::debug!(url = %url, "Fetching upstream document");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Schema(format!("body is not JSON: {}", e)))
    }
}
