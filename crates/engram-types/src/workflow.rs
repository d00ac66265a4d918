//! Workflow domain types for Engram.
//!
//! Defines the immutable input shape (`WorkflowDefinition`, `StepDefinition`)
//! and the runtime entities the engine persists (`Workflow`, `DurableStep`),
//! along with the result contracts exchanged with execution units
//! (`StepExecutionResult`) and returned to callers (`ExecutionResult`).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Workflow Definition (immutable input)
// ---------------------------------------------------------------------------

/// A named sequence of steps submitted by a caller.
///
/// Definitions are structural input only: ids, statuses, and timestamps are
/// assigned when the lifecycle manager turns a definition into a `Workflow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Human-readable workflow name.
    pub name: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered list of step definitions. Order is preserved for the life of
    /// the workflow.
    pub steps: Vec<StepDefinition>,
}

/// A single step in a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Step name, unique within the definition.
    pub name: String,
    /// Identifier of the execution unit responsible for this step.
    pub agent: String,
    /// Optional role/capability hint used by resolvers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
    /// Names of steps that must complete before this one becomes ready.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Caller-supplied metadata attached to a workflow at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Optional priority label (e.g. "high").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Overall status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Completed | WorkflowStatus::Failed | WorkflowStatus::Cancelled
        )
    }
}

/// Status of an individual durable step.
///
/// The HITL "waiting" condition is a workflow-level pause signal and never
/// appears here: a waiting step stays `Pending` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

// ---------------------------------------------------------------------------
// Runtime entities
// ---------------------------------------------------------------------------

/// A workflow at runtime: the canonical durable entity.
///
/// Persisted wholesale to the snapshot store after every step -- never
/// patched in place -- and reconstructible from the activity log alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// UUIDv7 workflow id.
    pub id: Uuid,
    /// Grouping identifier for related executions (one coordinating session).
    pub context_id: String,
    /// Workflow name from the definition.
    pub name: String,
    /// Optional description from the definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current workflow status.
    pub status: WorkflowStatus,
    /// Ordered durable steps, one per definition step.
    pub steps: Vec<DurableStep>,
    /// Count of leading contiguously-completed steps. Always recomputed via
    /// [`Workflow::completed_prefix_len`], never independently mutated.
    pub current_step_index: usize,
    /// Opaque structured input payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Caller-supplied metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WorkflowMetadata>,
    /// When the workflow was created.
    pub created_at: DateTime<Utc>,
    /// When the workflow reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Why the workflow is paused, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,
}

impl Workflow {
    /// Count of leading contiguously-completed steps, scanned from index 0.
    ///
    /// Trailing completed steps beyond the first gap do not count toward the
    /// prefix used for resumption.
    pub fn completed_prefix_len(&self) -> usize {
        self.steps
            .iter()
            .take_while(|s| s.status == StepStatus::Completed)
            .count()
    }

    /// Outputs of every completed step, keyed by step name.
    pub fn previous_step_outputs(&self) -> HashMap<String, Value> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .filter_map(|s| s.output.clone().map(|o| (s.name.clone(), o)))
            .collect()
    }

    /// Whether every step has completed.
    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }
}

/// One unit of work within a workflow, independently trackable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurableStep {
    /// Derived id, unique across workflows: `{workflow_id}-{step_name}`.
    pub id: String,
    /// Step name from the definition, unique within the workflow.
    pub name: String,
    /// Execution unit identifier.
    pub agent: String,
    /// Optional role/capability hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
    /// Names of steps this step depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Current step status.
    pub status: StepStatus,
    /// Output produced on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure reported by the execution unit, if the step failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
    /// When execution started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When execution completed or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DurableStep {
    /// Build a pending durable step from a definition step.
    pub fn from_definition(workflow_id: Uuid, def: &StepDefinition) -> Self {
        Self {
            id: format!("{workflow_id}-{}", def.name),
            name: def.name.clone(),
            agent: def.agent.clone(),
            agent_role: def.agent_role.clone(),
            depends_on: def.depends_on.clone(),
            status: StepStatus::Pending,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution results
// ---------------------------------------------------------------------------

/// A step failure reported by an execution unit.
///
/// This is data, not a thrown error: a failed step is an expected, recordable
/// outcome. `retryable` is informational only -- the engine never retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Machine-readable failure code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Whether the caller could reasonably retry.
    pub retryable: bool,
}

/// Outcome of a single execution unit call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    /// Id of the step that was attempted.
    pub step_id: String,
    /// Whether the step completed successfully.
    pub success: bool,
    /// Output produced on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Failure details on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
    /// Wall-clock duration of the execution unit call.
    pub duration_ms: u64,
    /// HITL signal: the step needs external input before it can proceed.
    pub waiting: bool,
    /// Human-readable description of what the step is waiting for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting_message: Option<String>,
}

impl StepExecutionResult {
    /// A successful result carrying the step's output.
    pub fn completed(step_id: impl Into<String>, output: Value, duration_ms: u64) -> Self {
        Self {
            step_id: step_id.into(),
            success: true,
            output: Some(output),
            error: None,
            duration_ms,
            waiting: false,
            waiting_message: None,
        }
    }

    /// A failed result carrying the failure details.
    pub fn failed(step_id: impl Into<String>, failure: StepFailure, duration_ms: u64) -> Self {
        Self {
            step_id: step_id.into(),
            success: false,
            output: None,
            error: Some(failure),
            duration_ms,
            waiting: false,
            waiting_message: None,
        }
    }

    /// A waiting result: the workflow should pause for external input.
    pub fn waiting(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            success: false,
            output: None,
            error: None,
            duration_ms: 0,
            waiting: true,
            waiting_message: Some(message.into()),
        }
    }
}

/// Result of one engine invocation (sequential or parallel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The workflow that was executed.
    pub workflow_id: Uuid,
    /// Whether the whole workflow completed in this invocation.
    pub success: bool,
    /// Whether the workflow paused for external input.
    pub paused: bool,
    /// Index of the step that triggered the pause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at_step: Option<usize>,
    /// Failure of the step that failed the workflow, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
    /// Results for steps attempted in this invocation, in dispatch order.
    pub step_results: Vec<StepExecutionResult>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
