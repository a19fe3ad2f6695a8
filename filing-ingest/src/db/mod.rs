//! Record store access
//!
//! The store persists sessions and at most one record per session. Callers
//! depend on [`RecordStore`]; [`SqliteRecordStore`] is the production
//! implementation.

pub mod sqlite_store;

pub use sqlite_store::SqliteRecordStore;

use async_trait::async_trait;
use filing_common::Result;
use serde_json::Value;

use crate::models::{Record, ReportedProgress, Session, UpsertOutcome};

/// Session and record persistence
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Register a new session; fails with `Conflict` if the id is taken
    async fn create_session(&self, session: &Session) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    async fn get_record(&self, session_id: &str) -> Result<Option<Record>>;

    /// True when a record exists, without loading its payload
    async fn has_record(&self, session_id: &str) -> Result<bool>;

    /// Insert or replace the session's record in one atomic step
    ///
    /// An unknown session id is registered on the fly.
    async fn upsert_record(&self, session_id: &str, data: &Value)
        -> Result<(UpsertOutcome, Record)>;

    /// Store backend-reported progress; `NotFound` for unknown sessions
    async fn report_progress(&self, session_id: &str, progress: &ReportedProgress) -> Result<()>;

    /// Record a backend failure; `NotFound` for unknown sessions
    async fn mark_failed(&self, session_id: &str, reason: &str) -> Result<()>;
}
