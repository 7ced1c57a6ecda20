// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::spec::{TaskId, TaskSpec};
use crate::errors::{BranchdagError, Result};

/// Frozen, validated set of tasks.
///
/// Tasks keep the order in which they were declared; that order decides the
/// initial ready frontier and the order successors are enqueued in.
///
/// Construction checks referential integrity only. Cycles in the static
/// `deps` subgraph are left to the run, which reports them as
/// [`BranchdagError::CycleOrDeadlock`].
#[derive(Debug, Clone)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
    index: HashMap<TaskId, usize>,
}

impl TaskGraph {
    /// Freeze `tasks` into a graph.
    ///
    /// Fails if:
    /// - two tasks share an id
    /// - a task depends on itself or on an unknown id
    /// - an activator spawns itself or an unknown id
    pub fn new(tasks: Vec<TaskSpec>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tasks.len());

        for (pos, task) in tasks.iter().enumerate() {
            if index.insert(task.id.clone(), pos).is_some() {
                return Err(BranchdagError::InvalidGraph(format!(
                    "duplicate task id '{}'",
                    task.id
                )));
            }
        }

        for task in tasks.iter() {
            for dep in task.deps.iter() {
                if dep == &task.id {
                    return Err(BranchdagError::InvalidGraph(format!(
                        "task '{}' cannot depend on itself",
                        task.id
                    )));
                }
                if !index.contains_key(dep) {
                    return Err(BranchdagError::InvalidGraph(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.id, dep
                    )));
                }
            }

            for (label, target) in task.dynamic_spawns.iter() {
                if target == &task.id {
                    return Err(BranchdagError::InvalidGraph(format!(
                        "task '{}' cannot spawn itself as branch '{}'",
                        task.id, label
                    )));
                }
                if !index.contains_key(target) {
                    return Err(BranchdagError::InvalidGraph(format!(
                        "branch '{}' of task '{}' points to unknown task '{}'",
                        label, task.id, target
                    )));
                }
            }
        }

        Ok(Self { tasks, index })
    }

    /// All tasks, in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter()
    }

    pub fn task(&self, id: &str) -> Option<&TaskSpec> {
        self.index.get(id).map(|&pos| &self.tasks[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Ids of all tasks carrying the given declared name.
    pub fn ids_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.name == name)
            .map(|t| t.id.as_str())
    }
}
