//! Persisted extraction record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extraction outcome for a session (at most one per session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub session_id: String,
    /// Wire format payload
    pub data: Value,
    /// 1 on first insert, incremented by every replacement
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created or replaced the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// PUT /records/:session_id request
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRecordRequest {
    pub data: Value,
}

/// PUT /records/:session_id response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRecordResponse {
    pub session_id: String,
    pub outcome: UpsertOutcome,
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}
