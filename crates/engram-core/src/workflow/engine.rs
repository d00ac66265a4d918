//! Sequential and batched-parallel step execution.
//!
//! The engine drives a `Workflow` to completion, pause, or failure. Step
//! failures come back as data inside `ExecutionResult`; `EngineError` is
//! reserved for infrastructure problems (store failures, unresolvable steps,
//! task panics). After every completed step the whole workflow snapshot is
//! rewritten through the [`Journal`], so a crash loses at most the step that
//! was in flight.

use std::sync::Arc;

use chrono::Utc;
use engram_types::workflow::{
    ExecutionResult, StepExecutionResult, StepStatus, Workflow, WorkflowStatus,
};
use tokio::task::JoinSet;

use crate::store::activity::ActivityLog;
use crate::store::snapshot::SnapshotStore;
use crate::unit::{ExecutionUnitResolver, StepContext};
use crate::workflow::EngineError;
use crate::workflow::graph::ready_set;
use crate::workflow::journal::Journal;

/// Executes workflows step by step, persisting after each transition.
pub struct ExecutionEngine<S, L, R> {
    journal: Journal<S, L>,
    resolver: Arc<R>,
}

impl<S, L, R> ExecutionEngine<S, L, R>
where
    S: SnapshotStore,
    L: ActivityLog,
    R: ExecutionUnitResolver,
{
    pub fn new(snapshot: Arc<S>, log: Arc<L>, resolver: Arc<R>) -> Self {
        Self {
            journal: Journal::new(snapshot, log),
            resolver,
        }
    }

    /// Run steps strictly in definition order, skipping completed ones.
    ///
    /// Works identically for fresh, resumed, and recovered workflows: the
    /// first non-completed step is where execution picks up.
    pub async fn execute(&self, mut workflow: Workflow) -> Result<ExecutionResult, EngineError> {
        self.start(&mut workflow).await?;

        let mut step_results = Vec::new();

        for idx in 0..workflow.steps.len() {
            if workflow.steps[idx].status == StepStatus::Completed {
                continue;
            }

            let ctx = StepContext {
                workflow_id: workflow.id,
                previous_step_outputs: workflow.previous_step_outputs(),
            };
            let unit = self.resolver.resolve(&workflow.steps[idx])?;

            workflow.steps[idx].status = StepStatus::Running;
            workflow.steps[idx].started_at = Some(Utc::now());
            self.journal.write_workflow(&workflow).await?;

            tracing::info!(
                workflow_id = %workflow.id,
                step = %workflow.steps[idx].name,
                "executing step"
            );
            let result = unit.execute(&workflow.steps[idx], &ctx).await;

            if result.waiting {
                self.pause_at(&mut workflow, &[idx], &result).await?;
                step_results.push(result);
                return Ok(ExecutionResult {
                    workflow_id: workflow.id,
                    success: false,
                    paused: true,
                    paused_at_step: Some(idx),
                    error: None,
                    step_results,
                });
            }

            if !result.success {
                self.fail_at(&mut workflow, idx, &result).await?;
                let error = result.error.clone();
                step_results.push(result);
                return Ok(ExecutionResult {
                    workflow_id: workflow.id,
                    success: false,
                    paused: false,
                    paused_at_step: None,
                    error,
                    step_results,
                });
            }

            self.complete_at(&mut workflow, idx, &result).await?;
            step_results.push(result);
        }

        self.finish(&mut workflow).await?;
        Ok(ExecutionResult {
            workflow_id: workflow.id,
            success: true,
            paused: false,
            paused_at_step: None,
            error: None,
            step_results,
        })
    }

    /// Run steps in dependency-ordered batches: every round dispatches all
    /// ready steps concurrently and drains the whole batch before deciding
    /// the workflow's fate. A failure anywhere in a batch beats a pause.
    pub async fn execute_parallel(
        &self,
        mut workflow: Workflow,
    ) -> Result<ExecutionResult, EngineError> {
        self.start(&mut workflow).await?;

        let mut step_results = Vec::new();

        loop {
            let ready = ready_set(&workflow.steps);
            if ready.is_empty() {
                break;
            }

            let ctx = StepContext {
                workflow_id: workflow.id,
                previous_step_outputs: workflow.previous_step_outputs(),
            };

            // Resolve every unit before spawning anything, so an unresolvable
            // step aborts the batch without side effects.
            let mut units = Vec::with_capacity(ready.len());
            for &idx in &ready {
                units.push(self.resolver.resolve(&workflow.steps[idx])?);
            }

            for &idx in &ready {
                workflow.steps[idx].status = StepStatus::Running;
                workflow.steps[idx].started_at = Some(Utc::now());
            }
            self.journal.write_workflow(&workflow).await?;

            tracing::info!(
                workflow_id = %workflow.id,
                batch_size = ready.len(),
                "dispatching parallel batch"
            );

            let mut tasks = JoinSet::new();
            for (&idx, unit) in ready.iter().zip(units) {
                let step = workflow.steps[idx].clone();
                let ctx = ctx.clone();
                tasks.spawn(async move {
                    let result = unit.execute(&step, &ctx).await;
                    (idx, result)
                });
            }

            let mut batch: Vec<(usize, StepExecutionResult)> = Vec::with_capacity(ready.len());
            while let Some(joined) = tasks.join_next().await {
                batch.push(joined.map_err(|e| EngineError::Join(e.to_string()))?);
            }
            batch.sort_by_key(|(idx, _)| *idx);

            // Persist successes first: even if a sibling failed, completed
            // work in this batch survives.
            for (idx, result) in &batch {
                if result.success {
                    self.complete_at(&mut workflow, *idx, result).await?;
                }
            }

            let failed = batch.iter().find(|(_, r)| !r.success && !r.waiting);
            if let Some((idx, result)) = failed {
                self.fail_at(&mut workflow, *idx, result).await?;
                let error = result.error.clone();
                step_results.extend(batch.into_iter().map(|(_, r)| r));
                return Ok(ExecutionResult {
                    workflow_id: workflow.id,
                    success: false,
                    paused: false,
                    paused_at_step: None,
                    error,
                    step_results,
                });
            }

            // Every waiting step must come back to pending, not just the
            // first one, or the next resumption finds them stuck in running
            // and computes an empty ready set.
            if let Some((paused_at, first_waiting)) = batch
                .iter()
                .find(|(_, r)| r.waiting)
                .map(|(idx, r)| (*idx, r.clone()))
            {
                let waiting: Vec<usize> = batch
                    .iter()
                    .filter(|(_, r)| r.waiting)
                    .map(|(idx, _)| *idx)
                    .collect();
                self.pause_at(&mut workflow, &waiting, &first_waiting).await?;
                step_results.extend(batch.into_iter().map(|(_, r)| r));
                return Ok(ExecutionResult {
                    workflow_id: workflow.id,
                    success: false,
                    paused: true,
                    paused_at_step: Some(paused_at),
                    error: None,
                    step_results,
                });
            }

            step_results.extend(batch.into_iter().map(|(_, r)| r));
        }

        if !workflow.all_steps_completed() {
            return Err(EngineError::InvalidState(format!(
                "workflow {} has no runnable steps but is not complete",
                workflow.id
            )));
        }

        self.finish(&mut workflow).await?;
        Ok(ExecutionResult {
            workflow_id: workflow.id,
            success: true,
            paused: false,
            paused_at_step: None,
            error: None,
            step_results,
        })
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    async fn start(&self, workflow: &mut Workflow) -> Result<(), EngineError> {
        if workflow.status.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "workflow {} is {:?} and cannot be executed",
                workflow.id, workflow.status
            )));
        }
        workflow.status = WorkflowStatus::Running;
        workflow.pause_reason = None;
        self.journal.write_workflow(workflow).await?;
        Ok(())
    }

    async fn complete_at(
        &self,
        workflow: &mut Workflow,
        idx: usize,
        result: &StepExecutionResult,
    ) -> Result<(), EngineError> {
        let step = &mut workflow.steps[idx];
        step.status = StepStatus::Completed;
        step.output = result.output.clone();
        step.completed_at = Some(Utc::now());
        workflow.current_step_index = workflow.completed_prefix_len();

        let step = workflow.steps[idx].clone();
        self.journal
            .record_step_completed(workflow, &step, result.duration_ms)
            .await?;
        Ok(())
    }

    async fn fail_at(
        &self,
        workflow: &mut Workflow,
        idx: usize,
        result: &StepExecutionResult,
    ) -> Result<(), EngineError> {
        let step = &mut workflow.steps[idx];
        step.status = StepStatus::Failed;
        step.error = result.error.clone();
        step.completed_at = Some(Utc::now());

        workflow.status = WorkflowStatus::Failed;
        workflow.completed_at = Some(Utc::now());
        workflow.current_step_index = workflow.completed_prefix_len();

        tracing::warn!(
            workflow_id = %workflow.id,
            step = %workflow.steps[idx].name,
            code = result.error.as_ref().map(|e| e.code.as_str()).unwrap_or(""),
            "step failed, failing workflow"
        );

        let step = workflow.steps[idx].clone();
        self.journal.record_step_failed(workflow, &step).await?;
        Ok(())
    }

    /// Pause for external input. Every waiting step goes back to `Pending`
    /// so resumption re-dispatches all of them.
    async fn pause_at(
        &self,
        workflow: &mut Workflow,
        waiting: &[usize],
        result: &StepExecutionResult,
    ) -> Result<(), EngineError> {
        for &idx in waiting {
            let step = &mut workflow.steps[idx];
            step.status = StepStatus::Pending;
            step.started_at = None;
        }

        workflow.status = WorkflowStatus::Paused;
        workflow.pause_reason = result.waiting_message.clone();
        workflow.current_step_index = workflow.completed_prefix_len();

        tracing::info!(
            workflow_id = %workflow.id,
            waiting_steps = waiting.len(),
            reason = workflow.pause_reason.as_deref().unwrap_or(""),
            "workflow paused for external input"
        );

        self.journal.write_workflow(workflow).await?;
        Ok(())
    }

    async fn finish(&self, workflow: &mut Workflow) -> Result<(), EngineError> {
        workflow.status = WorkflowStatus::Completed;
        workflow.completed_at = Some(Utc::now());
        workflow.current_step_index = workflow.steps.len();
        self.journal.write_workflow(workflow).await?;

        tracing::info!(workflow_id = %workflow.id, "workflow completed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{MemoryActivityLog, MemorySnapshotStore};
    use crate::store::snapshot;
    use crate::unit::ExecutionUnit;
    use engram_types::activity::ActivityQuery;
    use engram_types::workflow::{
        DurableStep, StepDefinition, StepFailure, WorkflowDefinition,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use uuid::Uuid;

    // -----------------------------------------------------------------------
    // Scripted execution unit
    // -----------------------------------------------------------------------

    #[derive(Clone)]
    enum Behavior {
        Succeed(serde_json::Value),
        Fail(&'static str),
        Wait(&'static str),
    }

    /// Unit that follows a per-step script and records dispatch order.
    struct ScriptedUnit {
        behaviors: Mutex<HashMap<String, Behavior>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedUnit {
        fn new(behaviors: impl IntoIterator<Item = (&'static str, Behavior)>) -> Self {
            Self {
                behaviors: Mutex::new(
                    behaviors
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v))
                        .collect(),
                ),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.calls)
        }
    }

    impl ExecutionUnit for ScriptedUnit {
        async fn execute(&self, step: &DurableStep, _ctx: &StepContext) -> StepExecutionResult {
            self.calls.lock().unwrap().push(step.name.clone());
            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(&step.name)
                .cloned()
                .unwrap_or(Behavior::Succeed(json!(null)));
            match behavior {
                Behavior::Succeed(output) => {
                    StepExecutionResult::completed(step.id.clone(), output, 1)
                }
                Behavior::Fail(code) => StepExecutionResult::failed(
                    step.id.clone(),
                    StepFailure {
                        code: code.to_string(),
                        message: format!("step {} failed", step.name),
                        retryable: false,
                    },
                    1,
                ),
                Behavior::Wait(message) => {
                    StepExecutionResult::waiting(step.id.clone(), message)
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    fn step_def(name: &str, depends_on: Vec<&str>) -> StepDefinition {
        StepDefinition {
            name: name.to_string(),
            agent: "scripted".to_string(),
            agent_role: None,
            depends_on: depends_on.into_iter().map(String::from).collect(),
        }
    }

    fn three_step_workflow() -> Workflow {
        workflow_from(vec![
            step_def("gather", vec![]),
            step_def("analyze", vec!["gather"]),
            step_def("publish", vec!["analyze"]),
        ])
    }

    fn workflow_from(steps: Vec<StepDefinition>) -> Workflow {
        let id = Uuid::now_v7();
        let def = WorkflowDefinition {
            name: "test-workflow".to_string(),
            description: None,
            steps,
        };
        Workflow {
            id,
            context_id: "test".to_string(),
            name: def.name.clone(),
            description: None,
            status: WorkflowStatus::Pending,
            steps: def
                .steps
                .iter()
                .map(|s| DurableStep::from_definition(id, s))
                .collect(),
            current_step_index: 0,
            input: None,
            metadata: None,
            created_at: Utc::now(),
            completed_at: None,
            pause_reason: None,
        }
    }

    type TestEngine = ExecutionEngine<
        MemorySnapshotStore,
        MemoryActivityLog,
        crate::unit::StaticResolver,
    >;

    fn engine_with(
        unit: ScriptedUnit,
    ) -> (TestEngine, Arc<MemorySnapshotStore>, Arc<MemoryActivityLog>) {
        let snapshot = Arc::new(MemorySnapshotStore::new());
        let log = Arc::new(MemoryActivityLog::new());
        let resolver = Arc::new(crate::unit::StaticResolver::new(unit));
        (
            ExecutionEngine::new(Arc::clone(&snapshot), Arc::clone(&log), resolver),
            snapshot,
            log,
        )
    }

    async fn snapshot_status(store: &MemorySnapshotStore, id: &Uuid) -> String {
        let value = store
            .get(&snapshot::workflow_key(id))
            .await
            .unwrap()
            .unwrap();
        value["status"].as_str().unwrap().to_string()
    }

    // -----------------------------------------------------------------------
    // Sequential execution
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_sequential_runs_all_steps_in_order() {
        let unit = ScriptedUnit::new([
            ("gather", Behavior::Succeed(json!("articles"))),
            ("analyze", Behavior::Succeed(json!("insights"))),
            ("publish", Behavior::Succeed(json!("done"))),
        ]);
        let calls = unit.calls();
        let (engine, store, log) = engine_with(unit);
        let wf = three_step_workflow();
        let id = wf.id;

        let result = engine.execute(wf).await.unwrap();

        assert!(result.success);
        assert!(!result.paused);
        assert_eq!(result.step_results.len(), 3);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["gather", "analyze", "publish"]
        );
        assert_eq!(snapshot_status(&store, &id).await, "completed");

        let completed = log
            .query(&ActivityQuery::by_tags(["step", "completed"]))
            .await
            .unwrap();
        assert_eq!(completed.len(), 3);
    }

    #[tokio::test]
    async fn test_sequential_skips_completed_steps() {
        let unit = ScriptedUnit::new([]);
        let calls = unit.calls();
        let (engine, _store, _log) = engine_with(unit);

        let mut wf = three_step_workflow();
        wf.steps[0].status = StepStatus::Completed;
        wf.steps[0].output = Some(json!("already gathered"));
        wf.current_step_index = 1;

        let result = engine.execute(wf).await.unwrap();

        assert!(result.success);
        // Only the two unfinished steps were dispatched.
        assert_eq!(*calls.lock().unwrap(), vec!["analyze", "publish"]);
        assert_eq!(result.step_results.len(), 2);
    }

    #[tokio::test]
    async fn test_sequential_failure_stops_and_fails_workflow() {
        let unit = ScriptedUnit::new([
            ("gather", Behavior::Succeed(json!("articles"))),
            ("analyze", Behavior::Fail("X")),
        ]);
        let calls = unit.calls();
        let (engine, store, log) = engine_with(unit);
        let wf = three_step_workflow();
        let id = wf.id;

        let result = engine.execute(wf).await.unwrap();

        assert!(!result.success);
        assert!(!result.paused);
        assert_eq!(result.error.as_ref().unwrap().code, "X");
        // The step after the failure is never dispatched.
        assert_eq!(*calls.lock().unwrap(), vec!["gather", "analyze"]);
        assert_eq!(snapshot_status(&store, &id).await, "failed");

        let failed = log
            .query(&ActivityQuery::by_tags(["step", "failed", "analyze"]))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
    }

    #[tokio::test]
    async fn test_sequential_pause_and_resume() {
        let unit = ScriptedUnit::new([
            ("gather", Behavior::Succeed(json!("articles"))),
            ("analyze", Behavior::Wait("needs approval")),
        ]);
        let calls = unit.calls();
        let (engine, store, _log) = engine_with(unit);
        let wf = three_step_workflow();
        let id = wf.id;

        let result = engine.execute(wf).await.unwrap();

        assert!(!result.success);
        assert!(result.paused);
        assert_eq!(result.paused_at_step, Some(1));
        assert_eq!(snapshot_status(&store, &id).await, "paused");

        // Reload the paused state, lift the wait, and run again: the
        // completed first step is not re-dispatched.
        let value = store
            .get(&snapshot::workflow_key(&id))
            .await
            .unwrap()
            .unwrap();
        let paused: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(paused.pause_reason.as_deref(), Some("needs approval"));
        assert_eq!(paused.steps[1].status, StepStatus::Pending);

        calls.lock().unwrap().clear();
        // Same store, fresh script without the wait.
        let unit = ScriptedUnit::new([
            ("analyze", Behavior::Succeed(json!("insights"))),
            ("publish", Behavior::Succeed(json!("done"))),
        ]);
        let calls2 = unit.calls();
        let resolver = Arc::new(crate::unit::StaticResolver::new(unit));
        let engine2: TestEngine = ExecutionEngine::new(
            Arc::new((*store).clone()),
            Arc::new(MemoryActivityLog::new()),
            resolver,
        );

        let result = engine2.execute(paused).await.unwrap();
        assert!(result.success);
        assert_eq!(*calls2.lock().unwrap(), vec!["analyze", "publish"]);
    }

    #[tokio::test]
    async fn test_terminal_workflow_rejected() {
        let unit = ScriptedUnit::new([]);
        let (engine, _store, _log) = engine_with(unit);

        let mut wf = three_step_workflow();
        wf.status = WorkflowStatus::Completed;

        let err = engine.execute(wf).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    // -----------------------------------------------------------------------
    // Parallel execution
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_parallel_diamond_respects_dependencies() {
        let unit = ScriptedUnit::new([]);
        let calls = unit.calls();
        let (engine, _store, _log) = engine_with(unit);

        let wf = workflow_from(vec![
            step_def("a", vec![]),
            step_def("b", vec!["a"]),
            step_def("c", vec!["a"]),
            step_def("d", vec!["b", "c"]),
        ]);

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(result.success);
        assert_eq!(result.step_results.len(), 4);

        let order = calls.lock().unwrap().clone();
        assert_eq!(order[0], "a");
        assert_eq!(order[3], "d");
        // b and c ran in the middle round, in either order.
        let mut middle = vec![order[1].clone(), order[2].clone()];
        middle.sort();
        assert_eq!(middle, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_parallel_failure_beats_waiting() {
        let unit = ScriptedUnit::new([
            ("b", Behavior::Fail("BOOM")),
            ("c", Behavior::Wait("hold on")),
        ]);
        let (engine, store, _log) = engine_with(unit);

        let wf = workflow_from(vec![step_def("b", vec![]), step_def("c", vec![])]);
        let id = wf.id;

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(!result.success);
        assert!(!result.paused);
        assert_eq!(result.error.as_ref().unwrap().code, "BOOM");
        assert_eq!(snapshot_status(&store, &id).await, "failed");
    }

    #[tokio::test]
    async fn test_parallel_batch_success_survives_sibling_failure() {
        let unit = ScriptedUnit::new([
            ("ok", Behavior::Succeed(json!("fine"))),
            ("bad", Behavior::Fail("E")),
        ]);
        let (engine, _store, log) = engine_with(unit);

        let wf = workflow_from(vec![step_def("ok", vec![]), step_def("bad", vec![])]);

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(!result.success);

        // The sibling's completion was journaled even though the batch failed.
        let completed = log
            .query(&ActivityQuery::by_tags(["step", "completed", "ok"]))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
    }

    #[tokio::test]
    async fn test_parallel_pause_resets_every_waiting_step() {
        let unit = ScriptedUnit::new([
            ("b", Behavior::Wait("needs b input")),
            ("c", Behavior::Wait("needs c input")),
        ]);
        let (engine, store, _log) = engine_with(unit);

        let wf = workflow_from(vec![step_def("b", vec![]), step_def("c", vec![])]);
        let id = wf.id;

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(result.paused);

        // Both waiting siblings came back to pending, not just the first.
        let value = store
            .get(&snapshot::workflow_key(&id))
            .await
            .unwrap()
            .unwrap();
        let paused: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(paused.status, WorkflowStatus::Paused);
        assert_eq!(paused.steps[0].status, StepStatus::Pending);
        assert_eq!(paused.steps[1].status, StepStatus::Pending);
        assert!(paused.steps.iter().all(|s| s.started_at.is_none()));

        // Once the waits clear, the paused workflow runs to completion
        // instead of stalling on an empty ready set.
        let unit = ScriptedUnit::new([]);
        let resolver = Arc::new(crate::unit::StaticResolver::new(unit));
        let engine2: TestEngine = ExecutionEngine::new(
            Arc::new((*store).clone()),
            Arc::new(MemoryActivityLog::new()),
            resolver,
        );
        let result = engine2.execute_parallel(paused).await.unwrap();
        assert!(result.success);
        assert_eq!(result.step_results.len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_pause_persists_sibling_success() {
        let unit = ScriptedUnit::new([
            ("ok", Behavior::Succeed(json!("fine"))),
            ("hold", Behavior::Wait("needs signoff")),
        ]);
        let (engine, store, log) = engine_with(unit);

        let wf = workflow_from(vec![step_def("ok", vec![]), step_def("hold", vec![])]);
        let id = wf.id;

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(result.paused);
        assert!(!result.success);

        // The sibling that succeeded in the pausing batch is journaled as
        // completed; only the waiting step is re-dispatched on resume.
        let completed = log
            .query(&ActivityQuery::by_tags(["step", "completed", "ok"]))
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);

        let value = store
            .get(&snapshot::workflow_key(&id))
            .await
            .unwrap()
            .unwrap();
        let paused: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(paused.status, WorkflowStatus::Paused);
        assert_eq!(paused.steps[0].status, StepStatus::Completed);
        assert_eq!(paused.steps[0].output, Some(json!("fine")));
        assert_eq!(paused.steps[1].status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_parallel_pause_resets_waiting_step() {
        let unit = ScriptedUnit::new([("review", Behavior::Wait("needs signoff"))]);
        let (engine, store, _log) = engine_with(unit);

        let wf = workflow_from(vec![step_def("review", vec![])]);
        let id = wf.id;

        let result = engine.execute_parallel(wf).await.unwrap();
        assert!(result.paused);
        assert_eq!(result.paused_at_step, Some(0));

        let value = store
            .get(&snapshot::workflow_key(&id))
            .await
            .unwrap()
            .unwrap();
        let paused: Workflow = serde_json::from_value(value).unwrap();
        assert_eq!(paused.status, WorkflowStatus::Paused);
        assert_eq!(paused.steps[0].status, StepStatus::Pending);
    }
}
