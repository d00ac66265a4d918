use thiserror::Error;

/// Structural validation failures for workflow definitions.
///
/// Raised eagerly at creation time, before anything is persisted.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("duplicate step name: '{0}'")]
    DuplicateStep(String),

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("cycle detected involving step '{0}'")]
    CycleDetected(String),

    #[error("workflow must have at least one step")]
    Empty,

    #[error("invalid workflow name: {0}")]
    InvalidName(String),
}

/// Errors from snapshot store and activity log operations.
///
/// Propagated unmodified to callers -- the engine never swallows storage
/// failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("entry not found")]
    NotFound,
}
