#![allow(dead_code)]

pub use branchdag_test_utils::builders::{GraphBuilder, TaskSpecBuilder};
pub use branchdag_test_utils::init_tracing;
pub use branchdag_test_utils::recorder::ExecutionLog;

use branchdag::dag::TaskGraph;
use branchdag::engine::{Orchestrator, RunReport};
use branchdag::errors::Result;
use branchdag::exec::{BodyRef, FunctionRegistry};

/// Registry binding each `(func_ref, body)` pair.
pub fn registry_with(bodies: &[(&str, BodyRef)]) -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    for (key, body) in bodies {
        registry
            .register(*key, body.clone())
            .expect("test registry keys must be unique");
    }
    registry
}

/// Registry binding every `func_ref` of `graph` to a recording body, except
/// the keys given in `overrides`.
pub fn recording_registry(
    graph: &TaskGraph,
    log: &ExecutionLog,
    overrides: &[(&str, BodyRef)],
) -> FunctionRegistry {
    let mut registry = registry_with(overrides);
    for task in graph.tasks() {
        if !registry.has(&task.func_ref) {
            registry
                .register(task.func_ref.clone(), log.recording())
                .expect("fresh key");
        }
    }
    registry
}

pub fn run(graph: &TaskGraph, registry: FunctionRegistry) -> Result<RunReport> {
    init_tracing();
    Orchestrator::new(registry).run(graph)
}
