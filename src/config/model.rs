// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::{TaskGraph, TaskSpec};
use crate::engine::RuntimeOptions;
use crate::errors::Result;
use crate::types::{BranchDiscipline, Constraint};

/// Workflow definition as read from a TOML file, before validation.
///
/// ```toml
/// [workflow]
/// name = "demo"
/// max_in_flight = 2
///
/// [task.load]
/// params = { path = "data.csv" }
///
/// [task.evaluate]
/// after = ["load"]
/// branches = { high = "process_high", low = "process_low" }
/// discipline = "exactly_one"
///
/// [task.process_high]
/// [task.process_low]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowFile {
    /// Global settings from `[workflow]`.
    #[serde(default)]
    pub workflow: WorkflowSection,

    /// All tasks from `[task.<id>]`, keyed by task id.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated workflow definition.
///
/// Only obtainable through `TryFrom<RawWorkflowFile>` (see
/// [`validate`](crate::config::validate)), so holding one means the task
/// references resolve and the static dependencies are acyclic.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub workflow: WorkflowSection,
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    #[serde(default = "default_workflow_name")]
    pub name: String,

    /// Maximum number of task bodies the async runtime runs at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_workflow_name() -> String {
    "workflow".to_string()
}

fn default_max_in_flight() -> usize {
    1
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            name: default_workflow_name(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Registry key of the body; defaults to the task id.
    #[serde(default)]
    pub func: Option<String>,

    /// Declared name; defaults to the task id.
    #[serde(default)]
    pub name: Option<String>,

    /// Static dependencies (task ids).
    #[serde(default)]
    pub after: Vec<String>,

    /// Branch label -> task id this task may activate at run time.
    #[serde(default)]
    pub branches: BTreeMap<String, String>,

    #[serde(default)]
    pub discipline: BranchDiscipline,

    #[serde(default)]
    pub constraints: Vec<Constraint>,

    /// Free-form parameters handed to the body.
    #[serde(default)]
    pub params: toml::Table,
}

impl TaskConfig {
    pub fn effective_func<'a>(&'a self, id: &'a str) -> &'a str {
        self.func.as_deref().unwrap_or(id)
    }

    pub fn effective_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(id)
    }

    pub(crate) fn to_spec(&self, id: &str) -> TaskSpec {
        let mut spec = TaskSpec::new(id, self.effective_name(id), self.effective_func(id));
        spec.params = self.params.clone();
        spec.discipline = self.discipline;
        for dep in self.after.iter() {
            spec.add_dep(dep.as_str());
        }
        for (label, target) in self.branches.iter() {
            spec.add_spawn(label.as_str(), target.as_str());
        }
        for &constraint in self.constraints.iter() {
            spec.add_constraint(constraint);
        }
        spec
    }
}

impl RawWorkflowFile {
    /// Specs in task id order.
    pub(crate) fn specs(&self) -> Vec<TaskSpec> {
        self.task.iter().map(|(id, cfg)| cfg.to_spec(id)).collect()
    }
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(
        workflow: WorkflowSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self { workflow, task }
    }

    /// Freeze the definition into a task graph. Tasks are ordered by id.
    pub fn to_graph(&self) -> Result<TaskGraph> {
        let specs = self.task.iter().map(|(id, cfg)| cfg.to_spec(id)).collect();
        TaskGraph::new(specs)
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            max_in_flight: self.workflow.max_in_flight,
        }
    }
}
