// src/dag/run_state.rs

//! Mutable state of a single run and its transitions.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::dag::resolver::DependencyResolver;
use crate::dag::scheduler::Scheduler;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::spec::{BranchLabel, TaskId, TaskSpec};
use crate::dag::task_info::{TaskOutcome, TaskStatus};

/// Run-scoped state: tagged status per task plus the FIFO ready queue.
///
/// Created at the start of a run, dropped at its end. Only one driver may
/// mutate it at a time; both the synchronous orchestrator and the async
/// runtime funnel every transition through a single loop.
#[derive(Debug)]
pub struct RunState {
    statuses: HashMap<TaskId, TaskStatus>,
    scheduler: Scheduler,
}

impl RunState {
    /// Seed the run from the resolver.
    ///
    /// - direct branch targets start `BlockedDynamicPending`
    /// - `initial_ready()` tasks start `Ready` and are enqueued
    /// - everything else waits on its static indegree
    pub fn new(resolver: &DependencyResolver) -> Self {
        let spawn_targets: HashSet<&str> = resolver
            .tasks()
            .flat_map(|t| t.dynamic_spawns.values().map(String::as_str))
            .collect();

        let mut statuses = HashMap::new();
        for task in resolver.tasks() {
            let status = if spawn_targets.contains(task.id.as_str()) {
                TaskStatus::BlockedDynamicPending
            } else {
                TaskStatus::BlockedStatic {
                    pending: resolver.indegree(&task.id),
                }
            };
            statuses.insert(task.id.clone(), status);
        }

        let mut scheduler = Scheduler::new();
        let ready = resolver.initial_ready();
        for id in ready.iter() {
            statuses.insert(id.clone(), TaskStatus::Ready);
        }
        debug!(?ready, "run state: initial ready frontier");
        scheduler.add_ready(ready);

        Self {
            statuses,
            scheduler,
        }
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.statuses.get(id).copied()
    }

    /// Pop the next ready task, if any.
    pub fn next_ready(&mut self) -> Option<TaskId> {
        self.scheduler.next()
    }

    pub fn ready_len(&self) -> usize {
        self.scheduler.len()
    }

    pub fn mark_running(&mut self, id: &str) {
        self.set(id, TaskStatus::Running);
    }

    pub fn mark_failed(&mut self, id: &str) {
        self.set(id, TaskStatus::Done(TaskOutcome::Failed));
    }

    /// Mark `task` successful and apply its effects.
    ///
    /// Branch activation runs first so an activated target that also lists
    /// `task` in its `deps` sees it as already done. Static successors are
    /// only counted down while `BlockedStatic`.
    pub fn complete_success(
        &mut self,
        resolver: &DependencyResolver,
        task: &TaskSpec,
        registered: &[BranchLabel],
    ) -> SchedulerStep {
        self.set(&task.id, TaskStatus::Done(TaskOutcome::Success));

        let mut step = SchedulerStep::default();

        for label in registered {
            let Some(target) = task.dynamic_spawns.get(label) else {
                warn!(task = %task.id, %label, "registered label has no branch target; ignoring");
                continue;
            };
            self.activate_branch(resolver, target, &mut step);
        }

        for succ in resolver.successors(&task.id) {
            // Pending of a just-activated target already excludes `task`.
            if step.activated.contains(succ) {
                continue;
            }
            if let Some(TaskStatus::BlockedStatic { pending }) = self.statuses.get_mut(succ) {
                *pending = pending.saturating_sub(1);
                if *pending == 0 {
                    self.enqueue(succ, &mut step);
                }
            }
        }

        step
    }

    /// Unblock a dynamic branch target.
    ///
    /// The pending count is recomputed from the live status map rather than
    /// taken from a snapshot, so predecessors that finished while the branch
    /// was dormant are accounted for.
    fn activate_branch(
        &mut self,
        resolver: &DependencyResolver,
        target: &TaskId,
        step: &mut SchedulerStep,
    ) {
        match self.statuses.get(target) {
            Some(TaskStatus::BlockedDynamicPending) => {}
            Some(other) => {
                debug!(task = %target, status = ?other, "branch already activated; skipping");
                return;
            }
            None => {
                warn!(task = %target, "branch target missing from run state");
                return;
            }
        }

        let pending = resolver
            .task_of(target)
            .map(|t| {
                t.deps
                    .iter()
                    .filter(|d| !self.statuses.get(*d).is_some_and(|s| s.is_success()))
                    .count()
            })
            .unwrap_or(0);

        step.activated.push(target.clone());
        if pending == 0 {
            debug!(task = %target, "branch activated; ready");
            self.enqueue(target, step);
        } else {
            debug!(task = %target, pending, "branch activated; waiting on static predecessors");
            self.set(target, TaskStatus::BlockedStatic { pending });
            step.waiting_on_static.push(target.clone());
        }
    }

    fn enqueue(&mut self, id: &TaskId, step: &mut SchedulerStep) {
        self.set(id, TaskStatus::Ready);
        self.scheduler.add_ready([id.clone()]);
        step.newly_ready.push(id.clone());
    }

    fn set(&mut self, id: &str, status: TaskStatus) {
        match self.statuses.get_mut(id) {
            Some(slot) => *slot = status,
            None => warn!(task = %id, "status update for unknown task; ignoring"),
        }
    }

    /// Non-dynamic-only tasks that are not done yet, sorted by id.
    pub fn unfinished(&self, resolver: &DependencyResolver) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = resolver
            .tasks()
            .filter(|t| !resolver.is_dynamic_only(&t.id))
            .filter(|t| !self.statuses.get(&t.id).is_some_and(|s| s.is_done()))
            .map(|t| t.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Whether every non-dynamic-only task has reached a terminal state.
    pub fn is_complete(&self, resolver: &DependencyResolver) -> bool {
        self.unfinished(resolver).is_empty()
    }
}
