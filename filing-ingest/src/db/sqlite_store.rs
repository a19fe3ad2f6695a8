//! SQLite-backed record store
//!
//! Writes go through [`retry_on_lock`] so transient lock contention between
//! WAL writers is absorbed instead of surfacing as a request failure.

use async_trait::async_trait;
use filing_common::time::{from_storage, now, to_storage};
use filing_common::uuid_utils::is_valid_session_id;
use filing_common::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::RecordStore;
use crate::models::{Record, ReportedProgress, Session, UpsertOutcome};
use crate::utils::retry_on_lock;

/// Record store over a shared SQLite pool
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            max_lock_wait_ms,
        }
    }

    /// In-memory store with schema applied
    pub async fn in_memory() -> Result<Self> {
        let pool = filing_common::db::init_memory_database().await?;
        Ok(Self::new(pool, 5000))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn check_session_id(session_id: &str) -> Result<()> {
    if is_valid_session_id(session_id) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid session id: '{}'",
            session_id
        )))
    }
}

fn session_from_row(row: &SqliteRow) -> Result<Session> {
    let created_at: String = row.try_get("created_at")?;
    let progress: Option<i64> = row.try_get("progress")?;
    let current_step: Option<String> = row.try_get("current_step")?;

    Ok(Session {
        session_id: row.try_get("session_id")?,
        created_at: from_storage(&created_at)?,
        reported: progress.map(|percent| ReportedProgress {
            percent: percent.clamp(0, 100) as u8,
            current_step,
        }),
        failure: row.try_get("failure")?,
    })
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    let data: String = row.try_get("data")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Record {
        session_id: row.try_get("session_id")?,
        data: serde_json::from_str(&data)?,
        revision: row.try_get("revision")?,
        created_at: from_storage(&created_at)?,
        updated_at: from_storage(&updated_at)?,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_session(&self, session: &Session) -> Result<()> {
        check_session_id(&session.session_id)?;
        let created_at = to_storage(session.created_at);
        let progress = session.reported.as_ref().map(|p| i64::from(p.percent.min(100)));
        let current_step = session.reported.as_ref().and_then(|p| p.current_step.clone());

        let result = retry_on_lock("create_session", self.max_lock_wait_ms, || async {
            sqlx::query(
                r#"
                INSERT INTO sessions (session_id, created_at, progress, current_step, failure)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(session_id) DO NOTHING
                "#,
            )
            .bind(&session.session_id)
            .bind(&created_at)
            .bind(progress)
            .bind(&current_step)
            .bind(&session.failure)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "Session already exists: {}",
                session.session_id
            )));
        }

        tracing::info!(session_id = %session.session_id, "Session created");
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT session_id, created_at, progress, current_step, failure
            FROM sessions
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn get_record(&self, session_id: &str) -> Result<Option<Record>> {
        let row = sqlx::query(
            r#"
            SELECT session_id, data, revision, created_at, updated_at
            FROM records
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn has_record(&self, session_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn upsert_record(
        &self,
        session_id: &str,
        data: &Value,
    ) -> Result<(UpsertOutcome, Record)> {
        check_session_id(session_id)?;
        // Serialize before touching the database
        let payload = serde_json::to_string(data)?;
        let timestamp = to_storage(now());

        let row = retry_on_lock("upsert_record", self.max_lock_wait_ms, || async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO sessions (session_id, created_at)
                VALUES (?, ?)
                ON CONFLICT(session_id) DO NOTHING
                "#,
            )
            .bind(session_id)
            .bind(&timestamp)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query(
                r#"
                INSERT INTO records (session_id, data, revision, created_at, updated_at)
                VALUES (?, ?, 1, ?, ?)
                ON CONFLICT(session_id) DO UPDATE SET
                    data = excluded.data,
                    revision = records.revision + 1,
                    updated_at = excluded.updated_at
                RETURNING session_id, data, revision, created_at, updated_at
                "#,
            )
            .bind(session_id)
            .bind(&payload)
            .bind(&timestamp)
            .bind(&timestamp)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, Error>(row)
        })
        .await?;

        let record = record_from_row(&row)?;
        let outcome = if record.revision == 1 {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        };

        tracing::info!(
            session_id = %session_id,
            outcome = ?outcome,
            revision = record.revision,
            "Record upserted"
        );

        Ok((outcome, record))
    }

    async fn report_progress(&self, session_id: &str, progress: &ReportedProgress) -> Result<()> {
        let percent = i64::from(progress.percent.min(100));

        let result = retry_on_lock("report_progress", self.max_lock_wait_ms, || async {
            sqlx::query("UPDATE sessions SET progress = ?, current_step = ? WHERE session_id = ?")
                .bind(percent)
                .bind(&progress.current_step)
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Session not found: {}", session_id)));
        }

        tracing::debug!(session_id = %session_id, percent, "Progress reported");
        Ok(())
    }

    async fn mark_failed(&self, session_id: &str, reason: &str) -> Result<()> {
        let result = retry_on_lock("mark_failed", self.max_lock_wait_ms, || async {
            sqlx::query("UPDATE sessions SET failure = ? WHERE session_id = ?")
                .bind(reason)
                .bind(session_id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Session not found: {}", session_id)));
        }

        tracing::warn!(session_id = %session_id, reason, "Session marked failed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_and_load_session() {
        let store = SqliteRecordStore::in_memory().await.unwrap();
        let session = Session::with_id("s-1");
        store.create_session(&session).await.unwrap();

        let loaded = store.get_session("s-1").await.unwrap().unwrap();
        assert_eq!(loaded.session_id, "s-1");
        assert_eq!(
            loaded.created_at.timestamp_micros(),
            session.created_at.timestamp_micros()
        );
        assert!(loaded.reported.is_none());
        assert!(loaded.failure.is_none());
    }

    #[tokio::test]
    async fn duplicate_session_conflicts() {
        let store = SqliteRecordStore::in_memory().await.unwrap();
        store.create_session(&Session::with_id("dup")).await.unwrap();
        let err = store.create_session(&Session::with_id("dup")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_session_id_rejected() {
        let store = SqliteRecordStore::in_memory().await.unwrap();
        let err = store.upsert_record("  ", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates() {
        let store = SqliteRecordStore::in_memory().await.unwrap();

        let (first, record) = store.upsert_record("s-2", &json!({"a": 1})).await.unwrap();
        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(record.revision, 1);

        let (second, record) = store.upsert_record("s-2", &json!({"a": 2})).await.unwrap();
        assert_eq!(second, UpsertOutcome::Updated);
        assert_eq!(record.revision, 2);
        assert_eq!(record.data, json!({"a": 2}));

        // Implicit session registration
        assert!(store.get_session("s-2").await.unwrap().is_some());
        assert!(store.has_record("s-2").await.unwrap());
    }

    #[tokio::test]
    async fn progress_and_failure_require_session() {
        let store = SqliteRecordStore::in_memory().await.unwrap();
        let progress = ReportedProgress {
            percent: 40,
            current_step: Some("Scanning document".to_string()),
        };

        assert!(matches!(
            store.report_progress("ghost", &progress).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.mark_failed("ghost", "boom").await,
            Err(Error::NotFound(_))
        ));

        store.create_session(&Session::with_id("s-3")).await.unwrap();
        store.report_progress("s-3", &progress).await.unwrap();
        store.mark_failed("s-3", "OCR engine crashed").await.unwrap();

        let loaded = store.get_session("s-3").await.unwrap().unwrap();
        assert_eq!(loaded.reported, Some(progress));
        assert_eq!(loaded.failure.as_deref(), Some("OCR engine crashed"));
    }
}
