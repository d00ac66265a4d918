//! Reconstruction of workflow state from the activity log.
//!
//! When the snapshot store has no entry for a workflow, the full state is
//! rebuilt from log entries alone: the `{workflow, created}` entry supplies
//! the structure, and `{step, completed, name}` entries supply step facts.
//! The rebuilt workflow is re-persisted to the snapshot store, so the next
//! read short-circuits without scanning the log again.
//!
//! Recovery never fabricates a completed step without log evidence: a step
//! with no completion entry comes back `pending` and will simply be
//! re-executed. Store and log read errors propagate to the caller uncaught.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use engram_types::activity::{ActivityEntry, ActivityQuery};
use engram_types::error::StoreError;
use engram_types::workflow::{
    DurableStep, StepStatus, Workflow, WorkflowDefinition, WorkflowMetadata, WorkflowStatus,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::store::activity::ActivityLog;
use crate::store::snapshot::{self, SnapshotStore};
use crate::workflow::EngineError;
use crate::workflow::journal::{
    Journal, TAG_COMPLETED, TAG_CREATED, TAG_STEP, TAG_WORKFLOW,
};

/// Rebuilds workflows from the activity log when their snapshot is gone.
pub struct RecoveryService<S, L> {
    snapshot: Arc<S>,
    log: Arc<L>,
    journal: Journal<S, L>,
}

impl<S: SnapshotStore, L: ActivityLog> RecoveryService<S, L> {
    pub fn new(snapshot: Arc<S>, log: Arc<L>) -> Self {
        Self {
            snapshot: Arc::clone(&snapshot),
            log: Arc::clone(&log),
            journal: Journal::new(snapshot, log),
        }
    }

    /// Return the workflow from its snapshot, or rebuild it from the log.
    ///
    /// `None` means the workflow is unknown to both stores. A successful
    /// reconstruction re-primes the snapshot and appends a
    /// `{workflow, recovered}` audit entry; a snapshot hit does neither.
    pub async fn recover_workflow(&self, id: &Uuid) -> Result<Option<Workflow>, EngineError> {
        if let Some(value) = self.snapshot.get(&snapshot::workflow_key(id)).await? {
            let workflow = serde_json::from_value(value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            return Ok(Some(workflow));
        }

        let created = self
            .log
            .query(&ActivityQuery::by_tags([TAG_WORKFLOW, TAG_CREATED]))
            .await?;
        let Some(entry) = created
            .iter()
            .rev()
            .find(|e| e.details["workflow_id"] == json!(id))
        else {
            return Ok(None);
        };

        tracing::warn!(workflow_id = %id, "snapshot missing, rebuilding from activity log");

        let mut workflow = self.rebuild_structure(id, entry)?;
        let mut steps_recovered = 0usize;

        for idx in 0..workflow.steps.len() {
            let name = workflow.steps[idx].name.clone();
            let completions = self
                .log
                .query(&ActivityQuery::by_tags([
                    TAG_STEP,
                    TAG_COMPLETED,
                    name.as_str(),
                ]))
                .await?;
            // Most recent matching entry wins.
            if let Some(completion) = completions
                .iter()
                .rev()
                .find(|e| e.details["workflow_id"] == json!(id))
            {
                let step = &mut workflow.steps[idx];
                step.status = StepStatus::Completed;
                step.output = non_null(completion.details.get("output"));
                step.started_at = opt_datetime(completion.details.get("started_at"));
                step.completed_at = opt_datetime(completion.details.get("completed_at"));
                steps_recovered += 1;
            }
        }

        workflow.current_step_index = workflow.completed_prefix_len();
        workflow.status = if workflow.all_steps_completed() {
            workflow.completed_at = workflow
                .steps
                .iter()
                .filter_map(|s| s.completed_at)
                .max();
            WorkflowStatus::Completed
        } else if steps_recovered > 0 {
            WorkflowStatus::Running
        } else {
            WorkflowStatus::Pending
        };

        self.journal
            .record_recovered(&workflow, steps_recovered)
            .await?;

        tracing::info!(
            workflow_id = %id,
            steps_recovered,
            status = ?workflow.status,
            "recovered workflow from activity log"
        );
        Ok(Some(workflow))
    }

    /// Rebuild the structural shell from the creation entry: definition,
    /// input, metadata, context. All steps start `pending`.
    fn rebuild_structure(
        &self,
        id: &Uuid,
        entry: &ActivityEntry,
    ) -> Result<Workflow, EngineError> {
        let definition: WorkflowDefinition =
            serde_json::from_value(entry.details["definition"].clone())
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let metadata: Option<WorkflowMetadata> = match non_null(entry.details.get("metadata")) {
            Some(value) => Some(
                serde_json::from_value(value)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?,
            ),
            None => None,
        };
        let context_id = entry
            .details
            .get("context_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Workflow {
            id: *id,
            context_id,
            name: definition.name.clone(),
            description: definition.description.clone(),
            status: WorkflowStatus::Pending,
            steps: definition
                .steps
                .iter()
                .map(|s| DurableStep::from_definition(*id, s))
                .collect(),
            current_step_index: 0,
            input: non_null(entry.details.get("input")),
            metadata,
            created_at: entry.created_at,
            completed_at: None,
            pause_reason: None,
        })
    }
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

fn opt_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    value.and_then(|v| serde_json::from_value(v.clone()).ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
