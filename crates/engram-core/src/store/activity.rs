//! Activity log trait.
//!
//! Append-only, queryable-by-tag storage for immutable facts. The log is the
//! sole recovery source for workflow state: anything not written here is
//! invisible to [`crate::workflow::recovery`].

use engram_types::activity::{ActivityEntry, ActivityQuery, NewActivity};
use engram_types::error::StoreError;
use uuid::Uuid;

/// Trait for the append-only activity log.
///
/// Query results are chronological (append order); when a query carries a
/// limit, the most recent matches are kept. Uses native async fn in traits
/// (RPITIT, Rust 2024 edition).
pub trait ActivityLog: Send + Sync {
    /// Append an entry, returning its assigned id.
    fn append(
        &self,
        entry: &NewActivity,
    ) -> impl std::future::Future<Output = Result<Uuid, StoreError>> + Send;

    /// Query entries. All set query fields must match (AND semantics).
    fn query(
        &self,
        query: &ActivityQuery,
    ) -> impl std::future::Future<Output = Result<Vec<ActivityEntry>, StoreError>> + Send;
}
