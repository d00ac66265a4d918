//! Snapshot store trait.
//!
//! Keyed, overwrite-in-place storage for the latest known state of a
//! workflow and of each step. Implementations live in `engram-infra`
//! (SQLite) and in [`super::memory`] (embedded/in-memory).

use engram_types::error::StoreError;
use serde_json::Value;
use uuid::Uuid;

/// Snapshot kind for whole-workflow values.
pub const KIND_WORKFLOW: &str = "workflow";

/// Snapshot kind for per-step status projections.
pub const KIND_STEP_STATUS: &str = "step_status";

/// Key under which a workflow snapshot is stored.
pub fn workflow_key(workflow_id: &Uuid) -> String {
    format!("workflow:{workflow_id}")
}

/// Key under which a step status projection is stored.
pub fn step_status_key(step_id: &str) -> String {
    format!("step:{step_id}:status")
}

/// A key/value pair returned by [`SnapshotStore::list`].
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: Value,
}

/// Trait for keyed overwrite-in-place snapshot storage.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SnapshotStore: Send + Sync {
    /// Set a value for a key (upsert), recording its kind for listing.
    fn set(
        &self,
        key: &str,
        value: &Value,
        kind: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Delete a key. No-op if the key does not exist.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List all entries of a given kind, ordered by key.
    fn list(
        &self,
        kind: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SnapshotEntry>, StoreError>> + Send;
}
