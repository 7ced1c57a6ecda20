// src/engine/context.rs

//! Per-invocation handle passed to task bodies.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::dag::{BranchLabel, TaskId, TaskSpec};
use crate::errors::{BranchdagError, Result};
use crate::types::BranchDiscipline;

/// Outputs shared across a run, keyed by `task:<id>:result` and by task name.
pub type SharedContext = BTreeMap<String, toml::Value>;

/// What an activator's selector decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelection {
    NoBranches,
    OneBranch(BranchLabel),
    ManyBranches(Vec<BranchLabel>),
}

impl BranchSelection {
    pub fn one(label: impl Into<BranchLabel>) -> Self {
        BranchSelection::OneBranch(label.into())
    }

    pub fn many<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<BranchLabel>,
    {
        BranchSelection::ManyBranches(labels.into_iter().map(Into::into).collect())
    }

    pub fn labels(&self) -> Vec<BranchLabel> {
        match self {
            BranchSelection::NoBranches => Vec::new(),
            BranchSelection::OneBranch(label) => vec![label.clone()],
            BranchSelection::ManyBranches(labels) => labels.clone(),
        }
    }
}

/// Handle through which a running task reads its inputs and, if it is an
/// activator, picks the branches that should run.
///
/// A fresh context is built for every invocation and consumed by the
/// orchestrator once the body returns. It owns everything it exposes so it
/// can be moved onto a blocking worker thread.
#[derive(Debug)]
pub struct ExecutionContext {
    task_id: TaskId,
    task_name: String,
    params: toml::Table,
    outputs: Arc<SharedContext>,
    branches: BTreeMap<BranchLabel, TaskId>,
    discipline: BranchDiscipline,
    registered: Vec<BranchLabel>,
    branch_error: Option<BranchdagError>,
}

impl ExecutionContext {
    pub fn new(task: &TaskSpec, outputs: Arc<SharedContext>) -> Self {
        Self {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            params: task.params.clone(),
            outputs,
            branches: task.dynamic_spawns.clone(),
            discipline: task.discipline,
            registered: Vec::new(),
            branch_error: None,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn params(&self) -> &toml::Table {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&toml::Value> {
        self.params.get(key)
    }

    /// Snapshot of the run's shared outputs taken when this task was
    /// dispatched.
    pub fn outputs(&self) -> &SharedContext {
        &self.outputs
    }

    /// Output stored under `key` (a task name or `task:<id>:result`).
    pub fn input(&self, key: &str) -> Option<&toml::Value> {
        self.outputs.get(key)
    }

    pub fn is_activator(&self) -> bool {
        !self.branches.is_empty()
    }

    pub fn discipline(&self) -> BranchDiscipline {
        self.discipline
    }

    /// Declared branch labels, sorted.
    pub fn branch_labels(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(String::as_str)
    }

    /// Register one branch to activate once this task succeeds.
    pub fn register_branch(&mut self, label: impl Into<BranchLabel>) -> Result<()> {
        let label = label.into();

        if !self.branches.contains_key(&label) {
            let err = BranchdagError::UnknownBranch {
                task: self.task_id.clone(),
                label: label.clone(),
            };
            if self.branch_error.is_none() {
                self.branch_error = Some(BranchdagError::UnknownBranch {
                    task: self.task_id.clone(),
                    label,
                });
            }
            return Err(err);
        }

        debug!(task = %self.task_id, %label, "branch registered");
        self.registered.push(label);
        Ok(())
    }

    /// Register several branches; stops at the first unknown label.
    pub fn register_branches<I, L>(&mut self, labels: I) -> Result<()>
    where
        I: IntoIterator<Item = L>,
        L: Into<BranchLabel>,
    {
        for label in labels {
            self.register_branch(label)?;
        }
        Ok(())
    }

    /// Register every label of a typed selection.
    pub fn select(&mut self, selection: BranchSelection) -> Result<()> {
        self.register_branches(selection.labels())
    }

    /// Labels registered so far, in registration order.
    pub fn registered(&self) -> &[BranchLabel] {
        &self.registered
    }

    /// First branch error raised through this context, if any.
    ///
    /// Taken by the orchestrator after the body returns, so a body that
    /// swallows the error still fails the run.
    pub(crate) fn take_branch_error(&mut self) -> Option<BranchdagError> {
        self.branch_error.take()
    }

    /// Registered labels with duplicates removed, first occurrence wins.
    pub(crate) fn distinct_registered(&self) -> Vec<BranchLabel> {
        let mut seen = Vec::with_capacity(self.registered.len());
        for label in self.registered.iter() {
            if !seen.contains(label) {
                seen.push(label.clone());
            }
        }
        seen
    }
}
