// src/engine/mod.rs

//! Execution engine.
//!
//! This module ties together:
//! - the per-invocation [`ExecutionContext`]
//! - the pure run state machine ([`core`])
//! - two drivers over it: the synchronous [`Orchestrator`] and the async
//!   [`Runtime`] shell that executes independent ready tasks concurrently
//! - the [`RunReport`] a successful run returns

use crate::dag::TaskId;
use crate::errors::Result;
use crate::exec::BodyResult;

/// Options for the async runtime.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Upper bound on task bodies executing at the same time. Values below 1
    /// are treated as 1, which reproduces the synchronous FIFO order.
    pub max_in_flight: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { max_in_flight: 1 }
    }
}

/// Completion message sent by an executor backend to the runtime.
#[derive(Debug)]
pub struct TaskFinished {
    pub task: TaskId,
    pub ctx: ExecutionContext,
    /// Outer error: the body could not be resolved. Inner: the body's own
    /// result.
    pub result: Result<BodyResult>,
}

pub mod context;
pub mod core;
pub mod orchestrator;
pub mod report;
pub mod runtime;

pub use context::{BranchSelection, ExecutionContext, SharedContext};
pub use self::core::{CoreRun, Dispatch};
pub use orchestrator::Orchestrator;
pub use report::RunReport;
pub use runtime::Runtime;
