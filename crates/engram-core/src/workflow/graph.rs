//! Definition validation and ready-set computation.
//!
//! Uses `petgraph` to model step dependencies as a directed graph.
//! Topological sort detects cycles at creation time; at execution time the
//! ready set is derived purely from step status, so it works identically for
//! fresh and recovered workflows.

use std::collections::{HashMap, HashSet};

use engram_types::error::DefinitionError;
use engram_types::workflow::{DurableStep, StepStatus, WorkflowDefinition};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

// ---------------------------------------------------------------------------
// Definition validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a `WorkflowDefinition`.
///
/// Checks:
/// - Name is non-empty
/// - At least one step exists
/// - All step names are unique
/// - All `depends_on` references point to existing step names
/// - The dependency graph is acyclic
pub fn validate_definition(def: &WorkflowDefinition) -> Result<(), DefinitionError> {
    if def.name.trim().is_empty() {
        return Err(DefinitionError::InvalidName(
            "workflow name must not be empty".to_string(),
        ));
    }

    if def.steps.is_empty() {
        return Err(DefinitionError::Empty);
    }

    let mut seen = HashSet::new();
    for step in &def.steps {
        if !seen.insert(step.name.as_str()) {
            return Err(DefinitionError::DuplicateStep(step.name.clone()));
        }
    }

    let name_to_idx: HashMap<&str, usize> = def
        .steps
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();

    // Build directed graph: edge from dependency -> dependent.
    let mut graph = DiGraph::<&str, ()>::new();
    let node_indices: Vec<_> = def
        .steps
        .iter()
        .map(|s| graph.add_node(s.name.as_str()))
        .collect();

    for step in &def.steps {
        let to_idx = name_to_idx[step.name.as_str()];
        for dep in &step.depends_on {
            let from_idx =
                name_to_idx
                    .get(dep.as_str())
                    .ok_or_else(|| DefinitionError::UnknownDependency {
                        step: step.name.clone(),
                        dependency: dep.clone(),
                    })?;
            graph.add_edge(node_indices[*from_idx], node_indices[to_idx], ());
        }
    }

    toposort(&graph, None).map_err(|cycle| {
        let node = graph[cycle.node_id()];
        DefinitionError::CycleDetected(node.to_string())
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Ready set
// ---------------------------------------------------------------------------

/// Indices of pending steps whose every dependency is completed.
///
/// This is the dispatch set for one parallel round. Derived from status
/// alone: recovered workflows with out-of-order completed steps produce the
/// correct set without extra bookkeeping.
pub fn ready_set(steps: &[DurableStep]) -> Vec<usize> {
    let completed: HashSet<&str> = steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .map(|s| s.name.as_str())
        .collect();

    steps
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.status == StepStatus::Pending
                && s.depends_on.iter().all(|d| completed.contains(d.as_str()))
        })
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
