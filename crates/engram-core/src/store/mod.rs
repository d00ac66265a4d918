//! Store ports: the snapshot store and the activity log.
//!
//! The snapshot store is a disposable cache of the latest whole-value state;
//! the activity log is the authoritative append-only record. Recovery treats
//! the log as the source of truth when the snapshot is missing.

pub mod activity;
pub mod memory;
pub mod snapshot;

pub use activity::ActivityLog;
pub use snapshot::{SnapshotEntry, SnapshotStore};
