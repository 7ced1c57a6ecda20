#![allow(dead_code)]

use branchdag::dag::{TaskGraph, TaskSpec};
use branchdag::types::{BranchDiscipline, Constraint};

/// Builder for a raw `TaskGraph`, bypassing the workflow builder so tests
/// control ids exactly. Every task's `name` and `func_ref` equal its id.
pub struct GraphBuilder {
    tasks: Vec<TaskSpec>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Shorthand for a task with only static dependencies.
    pub fn task(self, id: &str, deps: &[&str]) -> Self {
        let mut b = TaskSpecBuilder::new(id);
        for dep in deps {
            b = b.after(dep);
        }
        self.with_task(b.build())
    }

    pub fn specs(self) -> Vec<TaskSpec> {
        self.tasks
    }

    pub fn build(self) -> TaskGraph {
        TaskGraph::new(self.tasks).expect("Failed to build valid graph from builder")
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskSpec`.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            spec: TaskSpec::new(id, id, id),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.spec.name = name.to_string();
        self
    }

    pub fn func(mut self, func_ref: &str) -> Self {
        self.spec.func_ref = func_ref.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.spec.add_dep(dep);
        self
    }

    pub fn branch(mut self, label: &str, target: &str) -> Self {
        self.spec.add_spawn(label, target);
        self
    }

    pub fn exactly_one(mut self) -> Self {
        self.spec.discipline = BranchDiscipline::ExactlyOne;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.spec.add_constraint(constraint);
        self
    }

    pub fn param(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.spec.params.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}
