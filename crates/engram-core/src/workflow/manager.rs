//! Workflow lifecycle operations: create, read, list, pause, resume, cancel,
//! and run.
//!
//! The manager owns the caller-facing surface. Definitions are validated
//! eagerly at creation, before any identifier is assigned or anything is
//! persisted. Reads go through the snapshot store and fall back to log
//! reconstruction transparently: a missing snapshot is repaired by the
//! [`RecoveryService`] before the workflow is returned.

use std::sync::Arc;

use chrono::Utc;
use engram_types::activity::{ActivityEntry, ActivityQuery};
use engram_types::config::EngineConfig;
use engram_types::error::StoreError;
use engram_types::workflow::{
    DurableStep, ExecutionResult, Workflow, WorkflowDefinition, WorkflowMetadata, WorkflowStatus,
};
use serde_json::Value;
use uuid::Uuid;

use crate::store::activity::ActivityLog;
use crate::store::snapshot::{self, SnapshotStore};
use crate::unit::ExecutionUnitResolver;
use crate::workflow::EngineError;
use crate::workflow::engine::ExecutionEngine;
use crate::workflow::graph::validate_definition;
use crate::workflow::journal::Journal;
use crate::workflow::recovery::RecoveryService;

/// Caller-facing workflow lifecycle manager.
pub struct WorkflowManager<S, L, R> {
    snapshot: Arc<S>,
    log: Arc<L>,
    journal: Journal<S, L>,
    engine: ExecutionEngine<S, L, R>,
    recovery: RecoveryService<S, L>,
    context_id: String,
    config: EngineConfig,
}

impl<S, L, R> WorkflowManager<S, L, R>
where
    S: SnapshotStore,
    L: ActivityLog,
    R: ExecutionUnitResolver,
{
    pub fn new(
        snapshot: Arc<S>,
        log: Arc<L>,
        resolver: Arc<R>,
        context_id: impl Into<String>,
    ) -> Self {
        Self::with_config(snapshot, log, resolver, context_id, EngineConfig::default())
    }

    /// Build a manager with explicit settings, typically loaded from
    /// `config.toml` by the hosting process.
    pub fn with_config(
        snapshot: Arc<S>,
        log: Arc<L>,
        resolver: Arc<R>,
        context_id: impl Into<String>,
        config: EngineConfig,
    ) -> Self {
        Self {
            snapshot: Arc::clone(&snapshot),
            log: Arc::clone(&log),
            journal: Journal::new(Arc::clone(&snapshot), Arc::clone(&log)),
            engine: ExecutionEngine::new(
                Arc::clone(&snapshot),
                Arc::clone(&log),
                resolver,
            ),
            recovery: RecoveryService::new(snapshot, log),
            context_id: context_id.into(),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Validate a definition and persist a new pending workflow.
    ///
    /// Rejects malformed definitions before anything is written, so a failed
    /// create leaves no trace in either store.
    pub async fn create_workflow(
        &self,
        definition: WorkflowDefinition,
        input: Option<Value>,
        metadata: Option<WorkflowMetadata>,
    ) -> Result<Workflow, EngineError> {
        validate_definition(&definition)?;

        let id = Uuid::now_v7();
        let workflow = Workflow {
            id,
            context_id: self.context_id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            status: WorkflowStatus::Pending,
            steps: definition
                .steps
                .iter()
                .map(|s| DurableStep::from_definition(id, s))
                .collect(),
            current_step_index: 0,
            input,
            metadata,
            created_at: Utc::now(),
            completed_at: None,
            pause_reason: None,
        };

        let def_value = serde_json::to_value(&definition)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.journal.record_created(&workflow, &def_value).await?;

        tracing::info!(
            workflow_id = %workflow.id,
            name = %workflow.name,
            steps = workflow.steps.len(),
            "created workflow"
        );
        Ok(workflow)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Fetch a workflow, transparently rebuilding it from the activity log
    /// if its snapshot is missing. `None` means unknown to both stores.
    pub async fn get_workflow(&self, id: &Uuid) -> Result<Option<Workflow>, EngineError> {
        self.recovery.recover_workflow(id).await
    }

    /// List all snapshotted workflows, optionally filtered by status.
    /// Order is stable across repeated calls with no intervening writes.
    pub async fn list_workflows(
        &self,
        status: Option<WorkflowStatus>,
    ) -> Result<Vec<Workflow>, EngineError> {
        let entries = self.snapshot.list(snapshot::KIND_WORKFLOW).await?;
        let mut workflows = Vec::with_capacity(entries.len());
        for entry in entries {
            let workflow: Workflow = serde_json::from_value(entry.value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if status.is_none_or(|s| workflow.status == s) {
                workflows.push(workflow);
            }
        }
        workflows.sort_by_key(|w| w.created_at);
        Ok(workflows)
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Pause a running workflow. Has no effect on a step call already in
    /// flight; the engine observes the pause on its next snapshot write.
    pub async fn pause_workflow(
        &self,
        id: &Uuid,
        reason: impl Into<String>,
    ) -> Result<Workflow, EngineError> {
        let mut workflow = self.load(id).await?;
        if workflow.status != WorkflowStatus::Running {
            return Err(EngineError::InvalidState(format!(
                "workflow {id} is {:?}, only running workflows can be paused",
                workflow.status
            )));
        }

        workflow.status = WorkflowStatus::Paused;
        workflow.pause_reason = Some(reason.into());
        self.journal.write_workflow(&workflow).await?;
        Ok(workflow)
    }

    /// Resume a paused workflow and drive it from its first non-completed
    /// step. A caller-supplied input replaces the stored input wholesale.
    pub async fn resume_workflow(
        &self,
        id: &Uuid,
        input: Option<Value>,
    ) -> Result<ExecutionResult, EngineError> {
        let mut workflow = self.load(id).await?;
        if workflow.status != WorkflowStatus::Paused {
            return Err(EngineError::InvalidState(
                "workflow not paused".to_string(),
            ));
        }

        if let Some(input) = input {
            workflow.input = Some(input);
        }
        workflow.pause_reason = None;

        tracing::info!(workflow_id = %id, "resuming workflow");
        self.engine.execute(workflow).await
    }

    /// Cancel a non-terminal workflow. Cannot interrupt a step call already
    /// in flight.
    pub async fn cancel_workflow(
        &self,
        id: &Uuid,
        reason: impl Into<String>,
    ) -> Result<Workflow, EngineError> {
        let mut workflow = self.load(id).await?;
        if workflow.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "workflow {id} is already {:?}",
                workflow.status
            )));
        }

        let reason = reason.into();
        workflow.status = WorkflowStatus::Cancelled;
        workflow.completed_at = Some(Utc::now());
        self.journal.record_cancelled(&workflow, &reason).await?;

        tracing::info!(workflow_id = %id, %reason, "cancelled workflow");
        Ok(workflow)
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Run a workflow in the configured mode: batched-parallel when
    /// `parallel_steps` is set, sequential otherwise.
    pub async fn run(&self, id: &Uuid) -> Result<ExecutionResult, EngineError> {
        if self.config.parallel_steps {
            self.run_workflow_parallel(id).await
        } else {
            self.run_workflow(id).await
        }
    }

    /// Run a workflow sequentially from its first non-completed step.
    pub async fn run_workflow(&self, id: &Uuid) -> Result<ExecutionResult, EngineError> {
        let workflow = self.load(id).await?;
        self.engine.execute(workflow).await
    }

    /// Run a workflow in dependency-ordered parallel batches.
    pub async fn run_workflow_parallel(
        &self,
        id: &Uuid,
    ) -> Result<ExecutionResult, EngineError> {
        let workflow = self.load(id).await?;
        self.engine.execute_parallel(workflow).await
    }

    async fn load(&self, id: &Uuid) -> Result<Workflow, EngineError> {
        self.get_workflow(id)
            .await?
            .ok_or(EngineError::WorkflowNotFound(*id))
    }

    // -----------------------------------------------------------------------
    // Activity
    // -----------------------------------------------------------------------

    /// The most recent activity entries, paged by the configured
    /// `activity_query_limit`. Chronological, oldest first.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>, EngineError> {
        let query = ActivityQuery {
            limit: Some(self.config.activity_query_limit as usize),
            ..ActivityQuery::default()
        };
        Ok(self.log.query(&query).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
