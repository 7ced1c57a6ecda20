// src/engine/report.rs

use std::collections::BTreeMap;

use crate::dag::{TaskId, TaskOutcome};
use crate::engine::context::SharedContext;

/// Outcome of a finished run.
///
/// Only tasks that actually ran appear in `statuses`; dynamic branches that
/// were never selected are absent rather than reported as failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub statuses: BTreeMap<TaskId, TaskOutcome>,
    /// Declared name of every task in `statuses`.
    pub names: BTreeMap<TaskId, String>,
    /// Shared outputs: the initial context plus every value a body returned,
    /// stored under `task:<id>:result` and under the task name.
    pub outputs: SharedContext,
    /// Task ids in the order they were executed.
    pub order: Vec<TaskId>,
}

impl RunReport {
    pub fn status_of(&self, id: &str) -> Option<TaskOutcome> {
        self.statuses.get(id).copied()
    }

    /// Status of the task with the given declared name.
    ///
    /// With several tasks sharing a name, the last one executed wins, the
    /// same rule the by-name outputs follow.
    pub fn status_by_name(&self, name: &str) -> Option<TaskOutcome> {
        self.order
            .iter()
            .rev()
            .find(|id| self.names.get(*id).is_some_and(|n| n == name))
            .and_then(|id| self.status_of(id))
    }

    pub fn output_of(&self, id: &str) -> Option<&toml::Value> {
        self.outputs.get(&result_key(id))
    }

    pub fn ran(&self, id: &str) -> bool {
        self.statuses.contains_key(id)
    }

    pub fn succeeded(&self) -> bool {
        self.statuses.values().all(|s| *s == TaskOutcome::Success)
    }
}

/// Key under which a task's output is stored in the shared context.
pub fn result_key(id: &str) -> String {
    format!("task:{id}:result")
}
