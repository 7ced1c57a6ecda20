// src/engine/core.rs

//! Pure core of a run.
//!
//! [`CoreRun`] owns the resolver and the run state and implements every
//! transition of the execution state machine. It performs no IO and never
//! runs task bodies itself: drivers pop [`Dispatch`]es from it, execute them
//! however they like, and feed the results back through
//! [`CoreRun::complete`].
//!
//! Two drivers exist:
//! - [`Orchestrator`](crate::engine::Orchestrator) runs bodies inline, one at
//!   a time, in FIFO order.
//! - [`Runtime`](crate::engine::Runtime) dispatches to an async executor
//!   backend and applies completions from a channel.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::dag::{
    ConstraintValidator, DependencyResolver, RunState, SchedulerStep, TaskGraph, TaskId,
    TaskOutcome,
};
use crate::engine::context::{ExecutionContext, SharedContext};
use crate::engine::report::{RunReport, result_key};
use crate::errors::{BranchdagError, Result};
use crate::exec::BodyResult;

/// A task handed to a driver for execution.
#[derive(Debug)]
pub struct Dispatch {
    pub task: TaskId,
    pub func_ref: String,
    pub ctx: ExecutionContext,
}

/// Synchronous state machine for one run.
#[derive(Debug)]
pub struct CoreRun {
    resolver: DependencyResolver,
    state: RunState,
    outputs: Arc<SharedContext>,
    statuses: BTreeMap<TaskId, TaskOutcome>,
    names: BTreeMap<TaskId, String>,
    order: Vec<TaskId>,
}

impl CoreRun {
    pub fn new(graph: &TaskGraph, initial: SharedContext) -> Self {
        let resolver = DependencyResolver::build(graph);
        let state = RunState::new(&resolver);
        Self {
            resolver,
            state,
            outputs: Arc::new(initial),
            statuses: BTreeMap::new(),
            names: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Outputs published so far.
    pub fn outputs(&self) -> &SharedContext {
        &self.outputs
    }

    /// Pop the next ready task, check its constraints and mark it running.
    ///
    /// Returns `Ok(None)` when the ready queue is empty. A constraint
    /// violation is returned as an error and ends the run.
    pub fn next_dispatch(&mut self) -> Result<Option<Dispatch>> {
        let Some(id) = self.state.next_ready() else {
            return Ok(None);
        };

        let task = self.resolver.task_of(&id).ok_or_else(|| {
            BranchdagError::InvalidGraph(format!("ready task '{id}' is not part of the graph"))
        })?;

        if let Err(err) = ConstraintValidator::validate(&self.resolver, task) {
            error!(task = %id, error = %err, "constraint check failed; aborting run");
            return Err(err);
        }

        self.state.mark_running(&id);
        debug!(task = %id, "dispatching task");

        let ctx = ExecutionContext::new(task, Arc::clone(&self.outputs));
        Ok(Some(Dispatch {
            task: id,
            func_ref: task.func_ref.clone(),
            ctx,
        }))
    }

    /// Apply the result of running `task`.
    ///
    /// Errors are checked in this order, each aborting the run:
    /// unbound `func_ref`, unknown branch registered through the context,
    /// body failure, branch cardinality. Only after all of them pass is the
    /// task marked successful and are branches and successors unblocked.
    pub fn complete(
        &mut self,
        task: &str,
        mut ctx: ExecutionContext,
        result: Result<BodyResult>,
    ) -> Result<SchedulerStep> {
        let spec = self.resolver.task_of(task).ok_or_else(|| {
            BranchdagError::InvalidGraph(format!("completed task '{task}' is not part of the graph"))
        })?;

        self.order.push(spec.id.clone());
        self.names.insert(spec.id.clone(), spec.name.clone());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(task, err)),
        };

        if let Some(err) = ctx.take_branch_error() {
            return Err(self.fail(task, err));
        }

        let value = match outcome {
            Ok(value) => value,
            Err(source) => {
                let err = BranchdagError::TaskBodyFailure {
                    task: spec.id.clone(),
                    name: spec.name.clone(),
                    source,
                };
                return Err(self.fail(task, err));
            }
        };

        let registered = ctx.distinct_registered();
        // The context shares `outputs`; release it so the insert below
        // updates in place instead of cloning the whole map.
        drop(ctx);
        if spec.is_activator() && !spec.discipline.accepts(registered.len()) {
            let err = BranchdagError::BranchCardinality {
                task: spec.id.clone(),
                registered: registered.len(),
            };
            return Err(self.fail(task, err));
        }

        if let Some(value) = value {
            let outputs = Arc::make_mut(&mut self.outputs);
            outputs.insert(result_key(&spec.id), value.clone());
            outputs.insert(spec.name.clone(), value);
        }

        self.statuses.insert(spec.id.clone(), TaskOutcome::Success);
        let step = self.state.complete_success(&self.resolver, spec, &registered);

        debug!(
            task = %spec.id,
            newly_ready = ?step.newly_ready,
            activated = ?step.activated,
            "task completed successfully"
        );

        Ok(step)
    }

    fn fail(&mut self, task: &str, err: BranchdagError) -> BranchdagError {
        self.state.mark_failed(task);
        self.statuses.insert(task.to_string(), TaskOutcome::Failed);
        error!(task = %task, error = %err, "task failed; aborting run");
        err
    }

    /// Decide how a run ends once nothing is ready or in flight.
    ///
    /// Succeeds iff every task outside the dynamic-only set is done.
    pub fn check_termination(&self) -> Result<()> {
        let pending = self.state.unfinished(&self.resolver);
        if pending.is_empty() {
            return Ok(());
        }

        for cycle in self.resolver.static_cycles() {
            warn!(?cycle, "static dependency cycle detected");
        }
        warn!(?pending, "no ready tasks left but run is incomplete");

        Err(BranchdagError::CycleOrDeadlock { pending })
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            statuses: self.statuses,
            names: self.names,
            outputs: Arc::unwrap_or_clone(self.outputs),
            order: self.order,
        }
    }
}
