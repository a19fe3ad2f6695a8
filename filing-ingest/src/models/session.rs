//! Processing session and status query model
//!
//! A session's status is derived, never stored: a session with a record is
//! `complete`, a session with a recorded backend failure is `failed`,
//! anything else is `processing`.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Status reported by the status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Backend still working
    Processing,
    /// Record available for fetching
    #[serde(alias = "completed")]
    Complete,
    /// Backend gave up; never retried
    #[serde(alias = "error")]
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// Where a progress figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressSource {
    /// Reported by the processing backend
    Reported,
    /// Synthesized from elapsed time
    Estimated,
    /// Terminal status
    Final,
}

/// Progress reported by the processing backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedProgress {
    #[serde(deserialize_with = "rounded_percent")]
    pub percent: u8,
    #[serde(default, rename = "currentStep", alias = "current_step")]
    pub current_step: Option<String>,
}

/// Processing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque identifier, conventionally a UUID
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    /// Latest backend-reported progress, if any
    pub reported: Option<ReportedProgress>,
    /// Backend failure reason, if processing failed
    pub failure: Option<String>,
}

impl Session {
    /// New session with a generated UUID
    pub fn new() -> Self {
        Self::with_id(filing_common::uuid_utils::generate().to_string())
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            created_at: Utc::now(),
            reported: None,
            failure: None,
        }
    }

    /// Elapsed seconds since creation, measured at `at`
    pub fn elapsed_seconds(&self, at: DateTime<Utc>) -> f64 {
        filing_common::time::elapsed_seconds(self.created_at, at)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Status query response
///
/// Field names follow the backend's mixed conventions (`sessionId`,
/// `currentStep`, `created_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(
        default,
        deserialize_with = "clamped_percent",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<u8>,
    #[serde(
        default,
        rename = "currentStep",
        alias = "current_step",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_step: Option<String>,
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_source: Option<ProgressSource>,
    /// Failure reason when `status` is `failed`
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Backend progress may arrive as any JSON number (`42.5`, `100.0`).
/// Rounded to a whole percent and clamped to 0..=100; non-finite reads as absent.
fn clamped_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u8))
}

/// Rounded but not clamped, so out-of-range reports can still be rejected
fn rounded_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = f64::deserialize(deserializer)?.round();
    if value.is_finite() && (0.0..=f64::from(u8::MAX)).contains(&value) {
        Ok(value as u8)
    } else {
        Err(de::Error::custom(format!("percent out of range: {}", value)))
    }
}

/// POST /sessions response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_accepts_completed_alias() {
        let status: JobStatus = serde_json::from_value(json!("completed")).unwrap();
        assert_eq!(status, JobStatus::Complete);
        assert_eq!(serde_json::to_value(status).unwrap(), json!("complete"));
    }

    #[test]
    fn minimal_status_response_parses() {
        let response: StatusResponse = serde_json::from_value(json!({ "status": "complete" })).unwrap();
        assert_eq!(response.status, JobStatus::Complete);
        assert!(response.progress.is_none());
        assert!(response.session_id.is_empty());
    }

    #[test]
    fn full_status_response_uses_backend_names() {
        let response = StatusResponse {
            status: JobStatus::Processing,
            progress: Some(42),
            current_step: Some("Analyzing content".to_string()),
            session_id: "abc".to_string(),
            created_at: None,
            progress_source: Some(ProgressSource::Estimated),
            error: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["currentStep"], "Analyzing content");
        assert_eq!(value["progress_source"], "estimated");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn fractional_progress_is_rounded() {
        let complete: StatusResponse =
            serde_json::from_value(json!({ "status": "complete", "progress": 100.0 })).unwrap();
        assert_eq!(complete.progress, Some(100));

        let processing: StatusResponse =
            serde_json::from_value(json!({ "status": "processing", "progress": 42.5 })).unwrap();
        assert_eq!(processing.progress, Some(43));
    }

    #[test]
    fn progress_outside_range_is_clamped() {
        let high: StatusResponse =
            serde_json::from_value(json!({ "status": "processing", "progress": 250 })).unwrap();
        assert_eq!(high.progress, Some(100));

        let low: StatusResponse =
            serde_json::from_value(json!({ "status": "processing", "progress": -3.2 })).unwrap();
        assert_eq!(low.progress, Some(0));

        let null: StatusResponse =
            serde_json::from_value(json!({ "status": "processing", "progress": null })).unwrap();
        assert!(null.progress.is_none());
    }

    #[test]
    fn reported_percent_accepts_floats() {
        let reported: ReportedProgress =
            serde_json::from_value(json!({ "percent": 42.5, "currentStep": "Mapping" })).unwrap();
        assert_eq!(reported.percent, 43);
        assert_eq!(reported.current_step.as_deref(), Some("Mapping"));

        assert!(serde_json::from_value::<ReportedProgress>(json!({ "percent": -1 })).is_err());
        assert!(serde_json::from_value::<ReportedProgress>(json!({ "percent": "high" })).is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_value::<StatusResponse>(json!({ "status": "sleeping" })).is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
