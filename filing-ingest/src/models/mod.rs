//! Data models for filing-ingest
//!
//! Sessions and records are what the store persists; status responses and
//! validation reports are what travels between services.

pub mod record;
pub mod session;
pub mod validation_report;

pub use record::{Record, UpsertOutcome, UpsertRecordRequest, UpsertRecordResponse};
pub use session::{
    CreateSessionResponse, JobStatus, ProgressSource, ReportedProgress, Session, StatusResponse,
};
pub use validation_report::{Severity, ValidationErrorItem, ValidationReport};
