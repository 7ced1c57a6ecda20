// src/engine/orchestrator.rs

use std::sync::Arc;

use tracing::info;

use crate::dag::TaskGraph;
use crate::engine::context::SharedContext;
use crate::engine::core::CoreRun;
use crate::engine::report::RunReport;
use crate::errors::Result;
use crate::exec::{Executor, FunctionRegistry};

/// Single-threaded driver: pops one ready task at a time, runs its body to
/// completion, applies its effects, repeats.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    executor: Executor,
}

impl Orchestrator {
    pub fn new(registry: impl Into<Arc<FunctionRegistry>>) -> Self {
        Self {
            executor: Executor::new(registry.into()),
        }
    }

    pub fn with_executor(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run `graph` to completion with an empty shared context.
    pub fn run(&self, graph: &TaskGraph) -> Result<RunReport> {
        self.run_with_context(graph, SharedContext::new())
    }

    /// Run `graph`, seeding the shared outputs with `initial`.
    ///
    /// Returns the report once every non-dynamic-only task is done, or the
    /// first error. Nothing is retried.
    pub fn run_with_context(&self, graph: &TaskGraph, initial: SharedContext) -> Result<RunReport> {
        info!(tasks = graph.len(), "run started");
        let mut core = CoreRun::new(graph, initial);

        while let Some(dispatch) = core.next_dispatch()? {
            let mut ctx = dispatch.ctx;
            let result = self.executor.execute(&dispatch.func_ref, &mut ctx);
            core.complete(&dispatch.task, ctx, result)?;
        }
        core.check_termination()?;

        let report = core.into_report();
        info!(executed = report.order.len(), "run finished");
        Ok(report)
    }
}
