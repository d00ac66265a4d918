//! SQLite snapshot store implementation.
//!
//! Implements `SnapshotStore` from `engram-core` using sqlx with split
//! read/write pools. Values are stored as JSON text and deserialized on read.

use chrono::{DateTime, Utc};
use engram_core::store::snapshot::{SnapshotEntry, SnapshotStore};
use engram_types::error::StoreError;
use serde_json::Value;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SnapshotStore`.
pub struct SqliteSnapshotStore {
    pool: DatabasePool,
}

impl SqliteSnapshotStore {
    /// Create a new snapshot store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl SnapshotStore for SqliteSnapshotStore {
    async fn set(&self, key: &str, value: &Value, kind: &str) -> Result<(), StoreError> {
        let now = format_datetime(&Utc::now());
        let value_str = serde_json::to_string(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO snapshots (key, kind, value, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT (key) DO UPDATE SET kind = excluded.kind, value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(kind)
        .bind(&value_str)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT value FROM snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let value_str: String = row
                    .try_get("value")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                let value: Value = serde_json::from_str(&value_str)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?")
            .bind(key)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, kind: &str) -> Result<Vec<SnapshotEntry>, StoreError> {
        let rows = sqlx::query("SELECT key, value FROM snapshots WHERE kind = ? ORDER BY key")
            .bind(kind)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let key: String = row
                .try_get("key")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let value_str: String = row
                .try_get("value")
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let value: Value = serde_json::from_str(&value_str)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            entries.push(SnapshotEntry { key, value });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let store = SqliteSnapshotStore::new(test_pool().await);

        let value = json!({"status": "running", "steps": [1, 2, 3]});
        store.set("workflow:abc", &value, "workflow").await.unwrap();

        let got = store.get("workflow:abc").await.unwrap();
        assert_eq!(got, Some(value));
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_none() {
        let store = SqliteSnapshotStore::new(test_pool().await);
        assert!(store.get("workflow:missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let store = SqliteSnapshotStore::new(test_pool().await);

        store
            .set("workflow:abc", &json!({"v": 1}), "workflow")
            .await
            .unwrap();
        store
            .set("workflow:abc", &json!({"v": 2}), "workflow")
            .await
            .unwrap();

        let got = store.get("workflow:abc").await.unwrap();
        assert_eq!(got, Some(json!({"v": 2})));

        // The overwrite did not leave a second row behind.
        let all = store.list("workflow").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_noop() {
        let store = SqliteSnapshotStore::new(test_pool().await);

        store
            .set("workflow:abc", &json!(1), "workflow")
            .await
            .unwrap();
        store.delete("workflow:abc").await.unwrap();
        assert!(store.get("workflow:abc").await.unwrap().is_none());

        // Should not error
        store.delete("workflow:abc").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_by_kind_and_sorts() {
        let store = SqliteSnapshotStore::new(test_pool().await);

        store.set("workflow:b", &json!(2), "workflow").await.unwrap();
        store.set("workflow:a", &json!(1), "workflow").await.unwrap();
        store
            .set("step:x:status", &json!("completed"), "step_status")
            .await
            .unwrap();

        let workflows = store.list("workflow").await.unwrap();
        assert_eq!(workflows.len(), 2);
        assert_eq!(workflows[0].key, "workflow:a");
        assert_eq!(workflows[1].key, "workflow:b");

        let steps = store.list("step_status").await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].value, json!("completed"));
    }
}
