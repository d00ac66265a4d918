//! SQLite storage layer.
//!
//! Store implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod activity;
pub mod pool;
pub mod snapshot;

pub use activity::SqliteActivityLog;
pub use pool::DatabasePool;
pub use snapshot::SqliteSnapshotStore;
