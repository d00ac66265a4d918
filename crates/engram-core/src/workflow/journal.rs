//! Dual-store write path for workflow state.
//!
//! Every durable transition goes through the `Journal`, which appends the
//! activity log entry strictly before writing the snapshot. The log is
//! authoritative and the snapshot is a disposable cache: a crash between the
//! two writes leaves the log ahead of the snapshot, which is exactly the
//! state the recovery subsystem tolerates.

use std::sync::Arc;

use engram_types::activity::NewActivity;
use engram_types::error::StoreError;
use engram_types::workflow::{DurableStep, Workflow};
use serde_json::{Value, json};

use crate::store::activity::ActivityLog;
use crate::store::snapshot::{self, SnapshotStore};

// ---------------------------------------------------------------------------
// Tag conventions
// ---------------------------------------------------------------------------

pub const TAG_WORKFLOW: &str = "workflow";
pub const TAG_STEP: &str = "step";
pub const TAG_CREATED: &str = "created";
pub const TAG_COMPLETED: &str = "completed";
pub const TAG_FAILED: &str = "failed";
pub const TAG_RECOVERED: &str = "recovered";
pub const TAG_CANCELLED: &str = "cancelled";

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Persists workflow transitions across the snapshot store and activity log.
pub struct Journal<S, L> {
    snapshot: Arc<S>,
    log: Arc<L>,
}

impl<S, L> Clone for Journal<S, L> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            log: Arc::clone(&self.log),
        }
    }
}

impl<S: SnapshotStore, L: ActivityLog> Journal<S, L> {
    pub fn new(snapshot: Arc<S>, log: Arc<L>) -> Self {
        Self { snapshot, log }
    }

    /// Write the workflow snapshot only (status flips: pause, resume, cancel).
    pub async fn write_workflow(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let value = to_value(workflow)?;
        self.snapshot
            .set(
                &snapshot::workflow_key(&workflow.id),
                &value,
                snapshot::KIND_WORKFLOW,
            )
            .await?;

        tracing::debug!(
            workflow_id = %workflow.id,
            status = ?workflow.status,
            "wrote workflow snapshot"
        );
        Ok(())
    }

    /// Record workflow creation: the `{workflow, created}` entry carries the
    /// full definition, input, and metadata -- the sole structural recovery
    /// source.
    pub async fn record_created(
        &self,
        workflow: &Workflow,
        definition: &Value,
    ) -> Result<(), StoreError> {
        let entry = NewActivity::new(
            TAG_WORKFLOW,
            format!("created workflow '{}'", workflow.name),
            json!({
                "workflow_id": workflow.id,
                "context_id": workflow.context_id,
                "definition": definition,
                "input": workflow.input,
                "metadata": workflow.metadata,
            }),
        )
        .with_tags([TAG_WORKFLOW, TAG_CREATED])
        .with_context(workflow.context_id.clone());

        self.log.append(&entry).await?;
        self.write_workflow(workflow).await
    }

    /// Record a completed step: log entry, then the per-step status
    /// projection, then the whole-workflow snapshot.
    pub async fn record_step_completed(
        &self,
        workflow: &Workflow,
        step: &DurableStep,
        duration_ms: u64,
    ) -> Result<(), StoreError> {
        let entry = NewActivity::new(
            TAG_STEP,
            format!("step completed: {}", step.name),
            json!({
                "workflow_id": workflow.id,
                "step_id": step.id,
                "output": step.output,
                "duration_ms": duration_ms,
                "started_at": step.started_at,
                "completed_at": step.completed_at,
            }),
        )
        .with_tags([TAG_STEP, TAG_COMPLETED, step.name.as_str()])
        .with_context(workflow.context_id.clone())
        .with_outcome("success");

        self.log.append(&entry).await?;
        self.write_step_projection(workflow, step).await?;
        self.write_workflow(workflow).await
    }

    /// Record a failed step. The failure entry is audit-only: recovery keys
    /// on completion entries and ignores these.
    pub async fn record_step_failed(
        &self,
        workflow: &Workflow,
        step: &DurableStep,
    ) -> Result<(), StoreError> {
        let entry = NewActivity::new(
            TAG_STEP,
            format!("step failed: {}", step.name),
            json!({
                "workflow_id": workflow.id,
                "step_id": step.id,
                "error": step.error,
            }),
        )
        .with_tags([TAG_STEP, TAG_FAILED, step.name.as_str()])
        .with_context(workflow.context_id.clone())
        .with_outcome("failure");

        self.log.append(&entry).await?;
        self.write_step_projection(workflow, step).await?;
        self.write_workflow(workflow).await
    }

    /// Record cancellation with its reason.
    pub async fn record_cancelled(
        &self,
        workflow: &Workflow,
        reason: &str,
    ) -> Result<(), StoreError> {
        let entry = NewActivity::new(
            TAG_WORKFLOW,
            format!("cancelled workflow '{}': {reason}", workflow.name),
            json!({
                "workflow_id": workflow.id,
                "reason": reason,
            }),
        )
        .with_tags([TAG_WORKFLOW, TAG_CANCELLED])
        .with_context(workflow.context_id.clone());

        self.log.append(&entry).await?;
        self.write_workflow(workflow).await
    }

    /// Record a reconstruction. The summary contains the word "recovered"
    /// for audit tooling.
    pub async fn record_recovered(
        &self,
        workflow: &Workflow,
        steps_recovered: usize,
    ) -> Result<(), StoreError> {
        let entry = NewActivity::new(
            TAG_WORKFLOW,
            format!(
                "recovered workflow '{}' from activity log ({steps_recovered} steps completed)",
                workflow.name
            ),
            json!({
                "workflow_id": workflow.id,
                "steps_recovered": steps_recovered,
                "status": workflow.status,
            }),
        )
        .with_tags([TAG_WORKFLOW, TAG_RECOVERED])
        .with_context(workflow.context_id.clone());

        self.log.append(&entry).await?;
        self.write_workflow(workflow).await
    }

    /// Per-step status/output projection, written for external visibility.
    /// Not read by recovery, which relies solely on the activity log.
    async fn write_step_projection(
        &self,
        workflow: &Workflow,
        step: &DurableStep,
    ) -> Result<(), StoreError> {
        let mut value = to_value(step)?;
        if let Value::Object(map) = &mut value {
            map.insert("workflow_id".to_string(), json!(workflow.id));
        }
        self.snapshot
            .set(
                &snapshot::step_status_key(&step.id),
                &value,
                snapshot::KIND_STEP_STATUS,
            )
            .await
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryActivityLog, MemorySnapshotStore};
    use chrono::Utc;
    use engram_types::activity::ActivityQuery;
    use engram_types::workflow::{StepStatus, WorkflowStatus};
    use uuid::Uuid;

    fn sample_workflow() -> Workflow {
        let id = Uuid::now_v7();
        Workflow {
            id,
            context_id: "session-1".to_string(),
            name: "digest".to_string(),
            description: None,
            status: WorkflowStatus::Running,
            steps: vec![DurableStep {
                id: format!("{id}-gather"),
                name: "gather".to_string(),
                agent: "researcher".to_string(),
                agent_role: None,
                depends_on: vec![],
                status: StepStatus::Completed,
                output: Some(json!("articles")),
                error: None,
                started_at: Some(Utc::now()),
                completed_at: Some(Utc::now()),
            }],
            current_step_index: 1,
            input: None,
            metadata: None,
            created_at: Utc::now(),
            completed_at: None,
            pause_reason: None,
        }
    }

    fn journal() -> (
        Journal<MemorySnapshotStore, MemoryActivityLog>,
        Arc<MemorySnapshotStore>,
        Arc<MemoryActivityLog>,
    ) {
        let snapshot = Arc::new(MemorySnapshotStore::new());
        let log = Arc::new(MemoryActivityLog::new());
        (
            Journal::new(Arc::clone(&snapshot), Arc::clone(&log)),
            snapshot,
            log,
        )
    }

    #[tokio::test]
    async fn test_record_created_writes_log_and_snapshot() {
        let (journal, snapshot, log) = journal();
        let wf = sample_workflow();

        journal
            .record_created(&wf, &json!({"name": "digest"}))
            .await
            .unwrap();

        let entries = log
            .query(&ActivityQuery::by_tags([TAG_WORKFLOW, TAG_CREATED]))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["workflow_id"], json!(wf.id));
        assert_eq!(entries[0].details["definition"]["name"], json!("digest"));

        let stored = snapshot
            .get(&snapshot::workflow_key(&wf.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["name"], json!("digest"));
    }

    #[tokio::test]
    async fn test_record_step_completed_writes_all_three() {
        let (journal, snapshot, log) = journal();
        let wf = sample_workflow();
        let step = wf.steps[0].clone();

        journal
            .record_step_completed(&wf, &step, 42)
            .await
            .unwrap();

        let entries = log
            .query(&ActivityQuery::by_tags([TAG_STEP, TAG_COMPLETED, "gather"]))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].details["duration_ms"], json!(42));
        assert_eq!(entries[0].outcome.as_deref(), Some("success"));

        let projection = snapshot
            .get(&snapshot::step_status_key(&step.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(projection["status"], json!("completed"));
        assert_eq!(projection["workflow_id"], json!(wf.id));

        assert!(
            snapshot
                .get(&snapshot::workflow_key(&wf.id))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_record_recovered_summary_contains_recovered() {
        let (journal, _snapshot, log) = journal();
        let wf = sample_workflow();

        journal.record_recovered(&wf, 1).await.unwrap();

        let entries = log
            .query(&ActivityQuery::by_tags([TAG_WORKFLOW, TAG_RECOVERED]))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].summary.contains("recovered"));
    }
}
