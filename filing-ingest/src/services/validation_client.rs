//! Taxonomy validation query
//!
//! The validator answers with either a success confirmation or a flat
//! [`ValidationReport`]. HTTP 400 and 422 responses carry a report body too.

use async_trait::async_trait;
use filing_common::config::BackendConfig;
use serde_json::{Map, Value};
use std::time::Duration;

use super::backend_client::BackendError;
use crate::models::ValidationReport;

const VALIDATE_PATH: &str = "/validate";

/// Validation query result
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid,
    Report(ValidationReport),
}

impl ValidationOutcome {
    /// Interpret a validator response body
    pub fn from_body(body: Map<String, Value>) -> Result<Self, BackendError> {
        if body.get("success").and_then(Value::as_bool) == Some(true) {
            return Ok(ValidationOutcome::Valid);
        }

        let report =
            ValidationReport::from_map(body).map_err(|e| BackendError::Parse(e.to_string()))?;
        if report.is_valid && report.is_empty() {
            Ok(ValidationOutcome::Valid)
        } else {
            Ok(ValidationOutcome::Report(report))
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

#[async_trait]
pub trait ValidationService: Send + Sync {
    /// Validate a mapped (Wire Format) filing
    async fn validate(&self, filing: &Value) -> Result<ValidationOutcome, BackendError>;
}

/// reqwest-based [`ValidationService`]
#[derive(Clone)]
pub struct HttpValidationClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpValidationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    /// Validator co-located with the processing backend
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            format!("{}{}", config.base_url.trim_end_matches('/'), VALIDATE_PATH),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ValidationService for HttpValidationClient {
    async fn validate(&self, filing: &Value) -> Result<ValidationOutcome, BackendError> {
        tracing::debug!(endpoint = %self.endpoint, "Submitting filing for validation");

        let response = self.http_client.post(&self.endpoint).json(filing).send().await?;
        let status = response.status();
        let carries_report = status.is_success()
            || status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY;

        if !carries_report {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::Status(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        let map: Map<String, Value> =
            serde_json::from_str(&body).map_err(|e| BackendError::Parse(e.to_string()))?;
        let outcome = ValidationOutcome::from_body(map)?;

        match &outcome {
            ValidationOutcome::Valid => tracing::info!("Filing passed validation"),
            ValidationOutcome::Report(report) => tracing::info!(
                findings = report.items().count(),
                is_valid = report.is_valid,
                "Validation report received"
            ),
        }

        Ok(outcome)
    }
}
