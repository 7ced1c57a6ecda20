// src/dag/spec.rs

//! Declarative description of a single task.

use std::collections::BTreeMap;

use crate::types::{BranchDiscipline, Constraint};

/// Canonical task identifier type used throughout the engine.
pub type TaskId = String;

/// Label under which an activator declares one of its dynamic branches.
pub type BranchLabel = String;

/// One task of a workflow graph.
///
/// `deps` and `constraints` behave as ordered sets: the `add_*` helpers keep
/// insertion order and ignore duplicates. A non-empty `dynamic_spawns` map
/// makes the task a dynamic activator.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: TaskId,
    /// Declared name, used for reporting and by-name outputs. Not unique.
    pub name: String,
    /// Key into the function registry.
    pub func_ref: String,
    /// Task-specific parameters handed to the body.
    pub params: toml::Table,
    /// Static predecessors.
    pub deps: Vec<TaskId>,
    /// Branch label -> task id this activator may unblock at run time.
    pub dynamic_spawns: BTreeMap<BranchLabel, TaskId>,
    pub discipline: BranchDiscipline,
    pub constraints: Vec<Constraint>,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, func_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            func_ref: func_ref.into(),
            params: toml::Table::new(),
            deps: Vec::new(),
            dynamic_spawns: BTreeMap::new(),
            discipline: BranchDiscipline::default(),
            constraints: Vec::new(),
        }
    }

    /// Whether this task decides at run time which of its branches run.
    pub fn is_activator(&self) -> bool {
        !self.dynamic_spawns.is_empty()
    }

    pub fn add_dep(&mut self, dep: impl Into<TaskId>) {
        let dep = dep.into();
        if !self.deps.contains(&dep) {
            self.deps.push(dep);
        }
    }

    pub fn add_spawn(&mut self, label: impl Into<BranchLabel>, target: impl Into<TaskId>) {
        self.dynamic_spawns.insert(label.into(), target.into());
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
    }

    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }
}
