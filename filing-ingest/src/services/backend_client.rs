//! Processing backend client
//!
//! [`JobBackend`] is the seam the poller talks through: one status query and
//! one result fetch per session. [`HttpJobBackend`] speaks the HTTP surface
//! served by this crate (`GET /status/:id`, `GET /records/:id`).

use async_trait::async_trait;
use filing_common::config::BackendConfig;
use std::time::Duration;
use thiserror::Error;

use crate::models::StatusResponse;
use crate::transform::WireFiling;

const USER_AGENT: &str = concat!("filing-ingest/", env!("CARGO_PKG_VERSION"));

/// Transient backend failures; the poller retries every variant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection, timeout or other network failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    Parse(String),

    /// Session or record not known to the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status
    #[error("Backend returned HTTP {0}: {1}")]
    Status(u16, String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Parse(err.to_string())
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

/// Status query plus result fetch
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn query_status(&self, session_id: &str) -> Result<StatusResponse, BackendError>;

    /// Wire Format payload of the finished record
    async fn fetch_record(&self, session_id: &str) -> Result<WireFiling, BackendError>;
}

/// reqwest-based [`JobBackend`]
#[derive(Clone)]
pub struct HttpJobBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpJobBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_body(&self, url: &str, session_id: &str) -> Result<String, BackendError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(session_id.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl JobBackend for HttpJobBackend {
    async fn query_status(&self, session_id: &str) -> Result<StatusResponse, BackendError> {
        let url = format!("{}/status/{}", self.base_url, session_id);
        tracing::debug!(session_id = %session_id, url = %url, "Querying job status");

        let body = self.get_body(&url, session_id).await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn fetch_record(&self, session_id: &str) -> Result<WireFiling, BackendError> {
        let url = format!("{}/records/{}", self.base_url, session_id);
        tracing::debug!(session_id = %session_id, url = %url, "Fetching record");

        let body = self.get_body(&url, session_id).await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let backend = HttpJobBackend::new(&BackendConfig {
            base_url: "http://localhost:9000/".to_string(),
            request_timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(backend.base_url(), "http://localhost:9000");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            BackendError::Status(502, "bad gateway".to_string()).to_string(),
            "Backend returned HTTP 502: bad gateway"
        );
        assert_eq!(
            BackendError::NotFound("abc".to_string()).to_string(),
            "Not found: abc"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is normally closed
        let backend = HttpJobBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 2000,
        })
        .unwrap();
        let err = backend.query_status("s").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
