// src/lib.rs

//! `branchdag`: a task-DAG engine whose tasks can activate downstream
//! branches at run time.
//!
//! Workflows are declared either programmatically through
//! [`workflow::Workflow`] or from a TOML file (see [`config`]), frozen into a
//! [`dag::TaskGraph`], and executed by the synchronous
//! [`engine::Orchestrator`] or the async [`engine::Runtime`].

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod workflow;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::loader::load_and_validate;
use crate::engine::{Orchestrator, RunReport, Runtime, SharedContext, TaskFinished};
use crate::errors::Result;
use crate::exec::{BlockingExecutorBackend, Executor, FunctionRegistry};

/// Load the workflow at `path` and run it to completion on the current
/// thread.
pub fn run_file(path: impl AsRef<Path>, registry: FunctionRegistry) -> Result<RunReport> {
    let path = path.as_ref();
    let cfg = load_and_validate(path)?;
    let graph = cfg.to_graph()?;

    info!(workflow = %cfg.workflow.name, path = %path.display(), "running workflow file");
    Orchestrator::new(registry).run(&graph)
}

/// Load the workflow at `path` and run it on the async runtime, executing up
/// to `[workflow].max_in_flight` independent bodies at once on Tokio's
/// blocking pool.
pub async fn run_file_concurrent(
    path: impl AsRef<Path>,
    registry: FunctionRegistry,
) -> Result<RunReport> {
    let path = path.as_ref();
    let cfg = load_and_validate(path)?;
    let graph = cfg.to_graph()?;
    let options = cfg.runtime_options();

    let (tx, rx) = mpsc::channel::<TaskFinished>(options.max_in_flight.max(1));
    let backend = BlockingExecutorBackend::new(Executor::new(Arc::new(registry)), tx);

    info!(
        workflow = %cfg.workflow.name,
        path = %path.display(),
        max_in_flight = options.max_in_flight,
        "running workflow file concurrently"
    );
    Runtime::new(backend, rx, options)
        .run(&graph, SharedContext::new())
        .await
}
