//! Service modules for the filing pipeline
//!
//! Server side: status synthesis backed by the record store and the progress
//! estimator. Client side: backend and validator clients plus the job poller.

pub mod backend_client;
pub mod job_poller;
pub mod progress_estimator;
pub mod status_service;
pub mod validation_client;

pub use backend_client::{BackendError, HttpJobBackend, JobBackend};
pub use job_poller::{
    BackoffPolicy, FinalRecord, NoopObserver, PollError, PollHandle, PollObserver, PollResult,
    Poller, RetryReason,
};
pub use progress_estimator::{step_label, ProgressEstimate, ProgressEstimator};
pub use status_service::StatusService;
pub use validation_client::{HttpValidationClient, ValidationOutcome, ValidationService};
