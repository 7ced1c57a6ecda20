// src/dag/scheduler_step.rs

//! Effects of applying one task completion to the run state.

use crate::dag::spec::TaskId;

/// Structured result of a single completion step.
///
/// Useful for tests that drive the state machine by hand and want to assert
/// what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that became ready (and were enqueued) as a result of this step,
    /// in enqueue order.
    pub newly_ready: Vec<TaskId>,
    /// Branch targets unblocked by the completed activator.
    pub activated: Vec<TaskId>,
    /// Activated branch targets still waiting on static predecessors.
    pub waiting_on_static: Vec<TaskId>,
}
