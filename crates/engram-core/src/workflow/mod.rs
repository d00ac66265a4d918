//! Workflow engine core: lifecycle management, DAG execution, and
//! snapshot-loss recovery.
//!
//! - `graph` -- definition validation and ready-set computation
//! - `journal` -- the dual-store write path (log append before snapshot write)
//! - `engine` -- sequential and batched-parallel step execution
//! - `manager` -- create/read/list/pause/cancel/resume lifecycle operations
//! - `recovery` -- reconstruction of workflow state from the activity log

pub mod engine;
pub mod graph;
pub mod journal;
pub mod manager;
pub mod recovery;

pub use engine::ExecutionEngine;
pub use manager::WorkflowManager;
pub use recovery::RecoveryService;

use engram_types::error::{DefinitionError, StoreError};
use uuid::Uuid;

/// Errors thrown synchronously by the lifecycle manager, engine, and
/// recovery subsystem.
///
/// Step-level failures are never represented here -- they are returned as
/// data inside `ExecutionResult`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed workflow definition, rejected at creation.
    #[error("invalid workflow definition: {0}")]
    Definition(#[from] DefinitionError),

    /// Operation not valid for the workflow's current status.
    #[error("invalid workflow state: {0}")]
    InvalidState(String),

    /// No workflow known under this id (snapshot and log both empty).
    #[error("workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    /// No execution unit available for a step.
    #[error("no execution unit available for step '{step}'")]
    UnresolvedStep { step: String },

    /// Snapshot store or activity log failure, propagated unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A spawned step task panicked or was aborted.
    #[error("task join error: {0}")]
    Join(String),
}
