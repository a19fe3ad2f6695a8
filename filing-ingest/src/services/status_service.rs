//! Status synthesis for the status query
//!
//! Precedence: an existing record means `complete`; a recorded failure means
//! `failed`; otherwise `processing`, with backend-reported progress when there
//! is any and the synthetic estimate when there is not.

use chrono::{DateTime, Utc};
use filing_common::{Error, Result};
use std::sync::Arc;

use super::progress_estimator::{step_label, ProgressEstimator};
use crate::db::RecordStore;
use crate::models::{JobStatus, ProgressSource, StatusResponse};

const COMPLETE_STEP: &str = "Complete";

#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn RecordStore>,
    estimator: ProgressEstimator,
}

impl StatusService {
    pub fn new(store: Arc<dyn RecordStore>, estimator: ProgressEstimator) -> Self {
        Self { store, estimator }
    }

    pub async fn status(&self, session_id: &str) -> Result<StatusResponse> {
        self.status_at(session_id, Utc::now()).await
    }

    /// Status as observed at `at`
    pub async fn status_at(&self, session_id: &str, at: DateTime<Utc>) -> Result<StatusResponse> {
        let session = self.store.get_session(session_id).await?;
        let has_record = self.store.has_record(session_id).await?;

        if has_record {
            return Ok(StatusResponse {
                status: JobStatus::Complete,
                progress: Some(100),
                current_step: Some(COMPLETE_STEP.to_string()),
                session_id: session_id.to_string(),
                created_at: session.map(|s| s.created_at),
                progress_source: Some(ProgressSource::Final),
                error: None,
            });
        }

        let session =
            session.ok_or_else(|| Error::NotFound(format!("Session not found: {}", session_id)))?;

        if let Some(reason) = session.failure.clone() {
            return Ok(StatusResponse {
                status: JobStatus::Failed,
                progress: None,
                current_step: None,
                session_id: session.session_id,
                created_at: Some(session.created_at),
                progress_source: Some(ProgressSource::Final),
                error: Some(reason),
            });
        }

        let (progress, current_step, source) = match &session.reported {
            Some(reported) => (
                reported.percent.min(100),
                reported
                    .current_step
                    .clone()
                    .unwrap_or_else(|| step_label(reported.percent).to_string()),
                ProgressSource::Reported,
            ),
            None => {
                let estimate = self.estimator.estimate(session.elapsed_seconds(at));
                (
                    estimate.percent,
                    estimate.step.to_string(),
                    ProgressSource::Estimated,
                )
            }
        };

        tracing::debug!(
            session_id = %session.session_id,
            progress,
            source = ?source,
            "Status synthesized"
        );

        Ok(StatusResponse {
            status: JobStatus::Processing,
            progress: Some(progress),
            current_step: Some(current_step),
            session_id: session.session_id,
            created_at: Some(session.created_at),
            progress_source: Some(source),
            error: None,
        })
    }
}
