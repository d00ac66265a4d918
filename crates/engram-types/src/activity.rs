//! Activity log types for Engram.
//!
//! The activity log is the append-only record of immutable facts ("workflow
//! created", "step completed") and the sole source of truth for recovery.
//! Entries carry a tag list; consumers query by tag with AND semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// An entry persisted in the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// UUIDv7 entry id, assigned on append.
    pub id: Uuid,
    /// Entry kind (e.g. "workflow", "step").
    pub kind: String,
    /// One-line human-readable summary.
    pub summary: String,
    /// Structured payload. For creation entries this carries the full
    /// definition, input, and metadata.
    pub details: Value,
    /// Optional grouping identifier for related executions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Optional outcome label (e.g. "success").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Importance score from 1 (low) to 5 (critical).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    /// Tags this entry is queryable by.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
}

/// Payload for appending a new activity entry.
///
/// Id and timestamp are assigned by the log on append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub kind: String,
    pub summary: String,
    pub details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewActivity {
    /// Create a new activity payload with the required fields.
    pub fn new(kind: impl Into<String>, summary: impl Into<String>, details: Value) -> Self {
        Self {
            kind: kind.into(),
            summary: summary.into(),
            details,
            context: None,
            outcome: None,
            importance: None,
            tags: vec![],
        }
    }

    /// Attach tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a grouping context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach an outcome label.
    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    /// Attach an importance score (1-5).
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = Some(importance);
        self
    }
}

/// Query against the activity log. All set fields must match (AND).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityQuery {
    /// Substring match on the summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Exact match on the entry kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Entry must carry every one of these tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Keep only the most recent N matches (results stay chronological).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ActivityQuery {
    /// Query by tags alone.
    pub fn by_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether an entry matches this query.
    pub fn matches(&self, entry: &ActivityEntry) -> bool {
        if let Some(kind) = &self.kind {
            if &entry.kind != kind {
                return false;
            }
        }
        if let Some(text) = &self.text {
            if !entry.summary.contains(text.as_str()) {
                return false;
            }
        }
        self.tags.iter().all(|t| entry.tags.contains(t))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
