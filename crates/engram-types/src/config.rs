//! Engine configuration.
//!
//! Loaded from `config.toml` in the data directory by `engram-infra`;
//! defaults apply when the file is missing or malformed.

use serde::{Deserialize, Serialize};

/// Default page size for activity log queries.
pub const DEFAULT_ACTIVITY_QUERY_LIMIT: u32 = 200;

/// Tunable engine settings, consumed by the workflow manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dispatch independent steps concurrently (batched-parallel mode).
    #[serde(default)]
    pub parallel_steps: bool,

    /// Default page size for activity log queries.
    #[serde(default = "default_activity_query_limit")]
    pub activity_query_limit: u32,

    /// Override for the SQLite database location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
}

fn default_activity_query_limit() -> u32 {
    DEFAULT_ACTIVITY_QUERY_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_steps: false,
            activity_query_limit: DEFAULT_ACTIVITY_QUERY_LIMIT,
            database_path: None,
        }
    }
}
