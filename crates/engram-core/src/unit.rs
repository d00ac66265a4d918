//! Execution unit ports.
//!
//! An execution unit performs the actual work of a step and reports its
//! outcome as a [`StepExecutionResult`] -- failures are returned as data,
//! never thrown. The engine guarantees it never calls `execute` for a step
//! that is already completed.
//!
//! `ExecutionUnit` uses RPITIT and therefore cannot be a trait object;
//! `ExecutionUnitDyn`/`BoxExecutionUnit` provide the object-safe mirror with
//! boxed futures and a blanket impl, so resolvers can hand out type-erased
//! units chosen at runtime.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use engram_types::workflow::{DurableStep, StepExecutionResult};
use serde_json::Value;
use uuid::Uuid;

use crate::workflow::EngineError;

// ---------------------------------------------------------------------------
// StepContext
// ---------------------------------------------------------------------------

/// Context handed to an execution unit alongside the step.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The workflow being executed.
    pub workflow_id: Uuid,
    /// Outputs of previously completed steps, keyed by step name.
    pub previous_step_outputs: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// ExecutionUnit
// ---------------------------------------------------------------------------

/// Trait for units that perform step work.
pub trait ExecutionUnit: Send + Sync {
    /// Attempt the step's work and report the outcome.
    fn execute(
        &self,
        step: &DurableStep,
        ctx: &StepContext,
    ) -> impl Future<Output = StepExecutionResult> + Send;
}

// ---------------------------------------------------------------------------
// Object-safe mirror
// ---------------------------------------------------------------------------

/// Object-safe version of [`ExecutionUnit`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation covers
/// every `ExecutionUnit`.
pub trait ExecutionUnitDyn: Send + Sync {
    fn execute_boxed<'a>(
        &'a self,
        step: &'a DurableStep,
        ctx: &'a StepContext,
    ) -> Pin<Box<dyn Future<Output = StepExecutionResult> + Send + 'a>>;
}

impl<T: ExecutionUnit> ExecutionUnitDyn for T {
    fn execute_boxed<'a>(
        &'a self,
        step: &'a DurableStep,
        ctx: &'a StepContext,
    ) -> Pin<Box<dyn Future<Output = StepExecutionResult> + Send + 'a>> {
        Box::pin(self.execute(step, ctx))
    }
}

/// Type-erased execution unit for runtime selection.
pub struct BoxExecutionUnit {
    inner: Box<dyn ExecutionUnitDyn>,
}

impl BoxExecutionUnit {
    /// Wrap a concrete `ExecutionUnit` in a type-erased box.
    pub fn new<T: ExecutionUnit + 'static>(unit: T) -> Self {
        Self {
            inner: Box::new(unit),
        }
    }

    /// Attempt the step's work and report the outcome.
    pub async fn execute(&self, step: &DurableStep, ctx: &StepContext) -> StepExecutionResult {
        self.inner.execute_boxed(step, ctx).await
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Chooses the execution unit responsible for a step.
///
/// Injected into the engine so role/capability matching stays outside the
/// core: the engine never inspects how units are represented.
pub trait ExecutionUnitResolver: Send + Sync {
    /// Resolve the unit for a step, or fail if none is available.
    fn resolve(&self, step: &DurableStep) -> Result<Arc<BoxExecutionUnit>, EngineError>;
}

/// Resolver that routes every step to a single unit.
pub struct StaticResolver {
    unit: Arc<BoxExecutionUnit>,
}

impl StaticResolver {
    /// Wrap a single unit as the resolver for all steps.
    pub fn new<T: ExecutionUnit + 'static>(unit: T) -> Self {
        Self {
            unit: Arc::new(BoxExecutionUnit::new(unit)),
        }
    }
}

impl ExecutionUnitResolver for StaticResolver {
    fn resolve(&self, _step: &DurableStep) -> Result<Arc<BoxExecutionUnit>, EngineError> {
        Ok(Arc::clone(&self.unit))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
