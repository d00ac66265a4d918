//! In-memory store implementations.
//!
//! `MemorySnapshotStore` and `MemoryActivityLog` back embedded deployments
//! and tests. Both are cheap to clone (shared interior state) and safe for
//! concurrent use.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use dashmap::DashMap;
use engram_types::activity::{ActivityEntry, ActivityQuery, NewActivity};
use engram_types::error::StoreError;
use serde_json::Value;
use uuid::Uuid;

use super::activity::ActivityLog;
use super::snapshot::{SnapshotEntry, SnapshotStore};

// ---------------------------------------------------------------------------
// MemorySnapshotStore
// ---------------------------------------------------------------------------

/// DashMap-backed snapshot store.
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    entries: Arc<DashMap<String, (String, Value)>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    async fn set(&self, key: &str, value: &Value, kind: &str) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_string(), (kind.to_string(), value.clone()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).map(|e| e.value().1.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn list(&self, kind: &str) -> Result<Vec<SnapshotEntry>, StoreError> {
        let mut entries: Vec<SnapshotEntry> = self
            .entries
            .iter()
            .filter(|e| e.value().0 == kind)
            .map(|e| SnapshotEntry {
                key: e.key().clone(),
                value: e.value().1.clone(),
            })
            .collect();
        // Stable order across repeated calls with no intervening writes.
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// MemoryActivityLog
// ---------------------------------------------------------------------------

/// Append-ordered in-memory activity log.
#[derive(Clone, Default)]
pub struct MemoryActivityLog {
    entries: Arc<RwLock<Vec<ActivityEntry>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries appended so far. Test/diagnostic helper.
    pub fn len(&self) -> usize {
        self.entries.read().expect("activity log lock poisoned").len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActivityLog for MemoryActivityLog {
    async fn append(&self, entry: &NewActivity) -> Result<Uuid, StoreError> {
        let id = Uuid::now_v7();
        let stored = ActivityEntry {
            id,
            kind: entry.kind.clone(),
            summary: entry.summary.clone(),
            details: entry.details.clone(),
            context: entry.context.clone(),
            outcome: entry.outcome.clone(),
            importance: entry.importance,
            tags: entry.tags.clone(),
            created_at: Utc::now(),
        };
        self.entries
            .write()
            .map_err(|_| StoreError::Connection("activity log lock poisoned".to_string()))?
            .push(stored);
        Ok(id)
    }

    async fn query(&self, query: &ActivityQuery) -> Result<Vec<ActivityEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Connection("activity log lock poisoned".to_string()))?;
        let mut matches: Vec<ActivityEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            if matches.len() > limit {
                matches.drain(..matches.len() - limit);
            }
        }
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
