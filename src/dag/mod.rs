// src/dag/mod.rs

//! Task graph model, resolution and per-run scheduling state.
//!
//! - [`spec`] holds the declarative [`TaskSpec`].
//! - [`graph`] freezes a set of specs into a validated [`TaskGraph`].
//! - [`resolver`] derives adjacency, indegree and the dynamic-only closure.
//! - [`constraints`] checks structural rules right before a task runs.
//! - [`scheduler`] is the FIFO ready queue.
//! - [`task_info`] provides the tagged per-run task status.
//! - [`run_state`] owns the mutable state of one run and its transitions.
//! - [`scheduler_step`] describes the effects of a single completion.

pub mod constraints;
pub mod graph;
pub mod resolver;
pub mod run_state;
pub mod scheduler;
pub mod scheduler_step;
pub mod spec;
pub mod task_info;

pub use constraints::ConstraintValidator;
pub use graph::TaskGraph;
pub use resolver::DependencyResolver;
pub use run_state::RunState;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use spec::{BranchLabel, TaskId, TaskSpec};
pub use task_info::{TaskOutcome, TaskStatus};
