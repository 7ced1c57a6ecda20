// src/dag/task_info.rs

//! Per-run task status.

use std::fmt;

/// Terminal outcome of a task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Success => f.write_str("SUCCESS"),
            TaskOutcome::Failed => f.write_str("FAILED"),
        }
    }
}

/// State of a task within one run.
///
/// The two blocked states are kept apart on purpose: a task waiting on
/// static predecessors counts them down, while a task waiting on dynamic
/// activation ignores predecessor completions until some activator
/// registers its branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for `pending` static predecessors to succeed.
    BlockedStatic { pending: usize },
    /// Branch target that no activator has selected yet.
    BlockedDynamicPending,
    /// Enqueued in the scheduler.
    Ready,
    /// Popped and executing.
    Running,
    Done(TaskOutcome),
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Done(TaskOutcome::Success))
    }
}
