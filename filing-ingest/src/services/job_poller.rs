//! Job status poller
//!
//! Polls a [`JobBackend`] until the session reaches a terminal outcome:
//!
//! - transport or parse failure: exponential backoff, `min(base * factor^n, cap)`
//! - `processing`: linear backoff, `min(base + n * step, cap)`
//! - `complete`: fetch the record once; a failed fetch counts as transient
//! - `failed`: stop immediately, never retried
//! - `max_attempts` status queries without a result: time out
//!
//! `n` counts prior retries of the same kind, so a run of transport errors
//! does not inflate the delay of a later `processing` answer.
//!
//! Cancellation is observed before every query, while any request is in
//! flight and during every backoff sleep. Once observed, no observer callback
//! fires again.

use filing_common::config::PollerConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backend_client::{BackendError, JobBackend};
use crate::models::{JobStatus, StatusResponse};
use crate::transform::WireFiling;

const UNKNOWN_FAILURE: &str = "unknown error";

/// Terminal poll failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    /// Backend reported `failed`
    #[error("processing failed: {reason}")]
    Failed { reason: String },

    /// `max_attempts` exhausted without a result
    #[error("timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("polling cancelled")]
    Cancelled,
}

/// Successful poll result
#[derive(Debug, Clone, PartialEq)]
pub struct FinalRecord {
    pub session_id: String,
    pub data: WireFiling,
    /// Status queries issued, including the final one
    pub attempts: u32,
}

pub type PollResult = Result<FinalRecord, PollError>;

/// Why the poller is about to wait
#[derive(Debug, Clone, PartialEq)]
pub enum RetryReason {
    /// Status query failed
    StatusUnavailable(BackendError),
    /// Backend still processing
    Processing,
    /// Status was complete but the record fetch failed
    FetchFailed(BackendError),
}

impl RetryReason {
    pub fn is_transient_failure(&self) -> bool {
        !matches!(self, RetryReason::Processing)
    }

    /// One-line status text suitable for end users
    pub fn status_message(&self, delay: Duration) -> String {
        let secs = delay.as_secs_f64();
        match self {
            RetryReason::Processing => format!("Still processing, checking again in {:.1}s", secs),
            RetryReason::StatusUnavailable(_) => {
                format!("Status temporarily unavailable, retrying in {:.1}s", secs)
            }
            RetryReason::FetchFailed(_) => {
                format!("Result not ready for download, retrying in {:.1}s", secs)
            }
        }
    }
}

/// Poll lifecycle callbacks
///
/// All methods default to no-ops. None of them is invoked after cancellation
/// has been observed; `on_terminal` fires exactly once for a poll that is not
/// cancelled.
pub trait PollObserver: Send + Sync {
    fn on_attempt(&self, _session_id: &str, _attempt: u32) {}

    fn on_progress(&self, _session_id: &str, _status: &StatusResponse) {}

    fn on_retry(&self, _session_id: &str, _reason: &RetryReason, _delay: Duration) {}

    fn on_terminal(&self, _session_id: &str, _outcome: &PollResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PollObserver for NoopObserver {}

/// Delay schedule derived from [`PollerConfig`]
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    config: PollerConfig,
}

impl BackoffPolicy {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Delay after the `n`th (0-based) transient failure of this poll
    pub fn transient_delay(&self, n: u32) -> Duration {
        let exponent = i32::try_from(n).unwrap_or(i32::MAX);
        let raw = self.config.error_base_ms as f64 * self.config.error_factor.powi(exponent);
        let capped = raw.min(self.config.error_cap_ms as f64);
        Duration::from_millis(capped.round() as u64)
    }

    /// Delay after the `n`th (0-based) `processing` answer of this poll
    pub fn processing_delay(&self, n: u32) -> Duration {
        let raw = self
            .config
            .processing_base_ms
            .saturating_add(u64::from(n).saturating_mul(self.config.processing_step_ms));
        Duration::from_millis(raw.min(self.config.processing_cap_ms))
    }
}

/// Drives one or more polls against a backend
#[derive(Clone)]
pub struct Poller {
    backend: Arc<dyn JobBackend>,
    max_attempts: u32,
    backoff: BackoffPolicy,
}

impl Poller {
    pub fn new(backend: Arc<dyn JobBackend>, config: &PollerConfig) -> Self {
        Self {
            backend,
            max_attempts: config.max_attempts,
            backoff: BackoffPolicy::new(config.clone()),
        }
    }

    /// Poll until a terminal outcome or cancellation
    pub async fn poll(
        &self,
        session_id: &str,
        observer: &dyn PollObserver,
        cancel: &CancellationToken,
    ) -> PollResult {
        match self.run(session_id, observer, cancel).await {
            Err(PollError::Cancelled) => {
                info!(session_id = %session_id, "Polling cancelled");
                Err(PollError::Cancelled)
            }
            outcome => {
                match &outcome {
                    Ok(record) => info!(
                        session_id = %session_id,
                        attempts = record.attempts,
                        "Polling finished with record"
                    ),
                    Err(err) => error!(session_id = %session_id, error = %err, "Polling failed"),
                }
                observer.on_terminal(session_id, &outcome);
                outcome
            }
        }
    }

    async fn run(
        &self,
        session_id: &str,
        observer: &dyn PollObserver,
        cancel: &CancellationToken,
    ) -> PollResult {
        let mut attempts = 0u32;
        let mut transient_failures = 0u32;
        let mut processing_answers = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }
            if attempts >= self.max_attempts {
                return Err(PollError::TimedOut { attempts });
            }

            attempts += 1;
            debug!(session_id = %session_id, attempt = attempts, "Querying status");
            observer.on_attempt(session_id, attempts);

            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                result = self.backend.query_status(session_id) => result,
            };
            if cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            let reason = match status {
                Err(err) => {
                    warn!(
                        session_id = %session_id,
                        attempt = attempts,
                        error = %err,
                        "Status query failed"
                    );
                    RetryReason::StatusUnavailable(err)
                }
                Ok(status) => {
                    observer.on_progress(session_id, &status);
                    match status.status {
                        JobStatus::Processing => RetryReason::Processing,
                        JobStatus::Failed => {
                            let reason = status
                                .error
                                .filter(|r| !r.trim().is_empty())
                                .unwrap_or_else(|| UNKNOWN_FAILURE.to_string());
                            return Err(PollError::Failed { reason });
                        }
                        JobStatus::Complete => {
                            let fetched = tokio::select! {
                                biased;
                                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                                result = self.backend.fetch_record(session_id) => result,
                            };
                            match fetched {
                                Ok(data) => {
                                    return Ok(FinalRecord {
                                        session_id: session_id.to_string(),
                                        data,
                                        attempts,
                                    })
                                }
                                Err(err) => {
                                    warn!(
                                        session_id = %session_id,
                                        attempt = attempts,
                                        error = %err,
                                        "Record fetch failed after completion"
                                    );
                                    RetryReason::FetchFailed(err)
                                }
                            }
                        }
                    }
                }
            };

            let delay = if reason.is_transient_failure() {
                transient_failures += 1;
                self.backoff.transient_delay(transient_failures - 1)
            } else {
                processing_answers += 1;
                self.backoff.processing_delay(processing_answers - 1)
            };

            // No point sleeping after the last permitted attempt
            if attempts >= self.max_attempts {
                return Err(PollError::TimedOut { attempts });
            }

            if cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }
            debug!(
                session_id = %session_id,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Backing off"
            );
            observer.on_retry(session_id, &reason, delay);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run a poll on the tokio runtime
    pub fn spawn(&self, session_id: impl Into<String>, observer: Arc<dyn PollObserver>) -> PollHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let poller = self.clone();
        let session_id = session_id.into();

        let join = tokio::spawn(async move { poller.poll(&session_id, observer.as_ref(), &token).await });

        PollHandle {
            cancel,
            join: Some(join),
        }
    }
}

/// Handle to a spawned poll; dropping it cancels the poll
pub struct PollHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<PollResult>>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |join| join.is_finished())
    }

    /// Wait for the terminal outcome
    pub async fn wait(mut self) -> PollResult {
        let Some(join) = self.join.take() else {
            return Err(PollError::Cancelled);
        };
        match join.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => Err(PollError::Cancelled),
            Err(err) => Err(PollError::Failed {
                reason: format!("poll task panicked: {}", err),
            }),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.cancel.cancel();
        }
    }
}
