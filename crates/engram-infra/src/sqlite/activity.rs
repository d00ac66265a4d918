//! SQLite activity log implementation.
//!
//! Implements `ActivityLog` from `engram-core`. Entries are append-only;
//! `details` and `tags` are stored as JSON text. Tag filtering uses the same
//! AND-semantics matcher as the in-memory log, applied after a kind-scoped
//! fetch, so both backends answer queries identically.

use chrono::{DateTime, Utc};
use engram_core::store::activity::ActivityLog;
use engram_types::activity::{ActivityEntry, ActivityQuery, NewActivity};
use engram_types::error::StoreError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ActivityLog`.
pub struct SqliteActivityLog {
    pool: DatabasePool,
}

impl SqliteActivityLog {
    /// Create a new activity log backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ActivityRow {
    id: String,
    kind: String,
    summary: String,
    details: String,
    context: Option<String>,
    outcome: Option<String>,
    importance: Option<i64>,
    tags: String,
    created_at: String,
}

impl ActivityRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            summary: row.try_get("summary")?,
            details: row.try_get("details")?,
            context: row.try_get("context")?,
            outcome: row.try_get("outcome")?,
            importance: row.try_get("importance")?,
            tags: row.try_get("tags")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_entry(self) -> Result<ActivityEntry, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Query(format!("invalid entry id: {e}")))?;
        let details = serde_json::from_str(&self.details)
            .map_err(|e| StoreError::Serialization(format!("invalid details JSON: {e}")))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| StoreError::Serialization(format!("invalid tags JSON: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(ActivityEntry {
            id,
            kind: self.kind,
            summary: self.summary,
            details,
            context: self.context,
            outcome: self.outcome,
            // Out-of-range values (hand-edited rows) read back as None
            // rather than wrapping.
            importance: self.importance.and_then(|i| u8::try_from(i).ok()),
            tags,
            created_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

// ---------------------------------------------------------------------------
// ActivityLog implementation
// ---------------------------------------------------------------------------

impl ActivityLog for SqliteActivityLog {
    async fn append(&self, entry: &NewActivity) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        let details = serde_json::to_string(&entry.details)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tags = serde_json::to_string(&entry.tags)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO activity_log (id, kind, summary, details, context, outcome, importance, tags, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id.to_string())
        .bind(&entry.kind)
        .bind(&entry.summary)
        .bind(&details)
        .bind(&entry.context)
        .bind(&entry.outcome)
        .bind(entry.importance.map(|i| i as i64))
        .bind(&tags)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(id)
    }

    async fn query(&self, query: &ActivityQuery) -> Result<Vec<ActivityEntry>, StoreError> {
        // UUIDv7 ids are time-ordered, so the id tiebreak keeps entries
        // appended within the same timestamp in append order.
        let rows = match &query.kind {
            Some(kind) => {
                sqlx::query("SELECT * FROM activity_log WHERE kind = ? ORDER BY created_at, id")
                    .bind(kind)
                    .fetch_all(&self.pool.reader)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM activity_log ORDER BY created_at, id")
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut matches = Vec::new();
        for row in &rows {
            let entry = ActivityRow::from_row(row)
                .map_err(|e| StoreError::Query(e.to_string()))?
                .into_entry()?;
            if query.matches(&entry) {
                matches.push(entry);
            }
        }

        if let Some(limit) = query.limit {
            if matches.len() > limit {
                matches.drain(..matches.len() - limit);
            }
        }
        Ok(matches)
    }
}
