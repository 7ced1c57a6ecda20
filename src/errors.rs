// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Every variant aborts the run that produced it; the engine never retries,
//! skips, or continues past a failed task.

use thiserror::Error;

use crate::dag::TaskId;
use crate::types::Constraint;

#[derive(Error, Debug)]
pub enum BranchdagError {
    /// The ready queue drained while non-dynamic-only tasks were still
    /// unfinished. Static cycles end up here too.
    #[error("deadlock or dependency cycle; unfinished tasks: {}", pending.join(", "))]
    CycleOrDeadlock { pending: Vec<TaskId> },

    #[error("task '{name}' ({task}) violates constraint {constraint}")]
    ConstraintViolation {
        task: TaskId,
        name: String,
        constraint: Constraint,
    },

    #[error("task '{task}' registered unknown branch '{label}'")]
    UnknownBranch { task: TaskId, label: String },

    #[error("task '{task}' must register exactly one branch, registered {registered}")]
    BranchCardinality { task: TaskId, registered: usize },

    #[error("task '{name}' ({task}) failed: {source}")]
    TaskBodyFailure {
        task: TaskId,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no function registered under '{0}'")]
    UnregisteredFunction(String),

    #[error("function ref '{0}' is already registered to a different body")]
    DuplicateRegistration(String),

    #[error("invalid task graph: {0}")]
    InvalidGraph(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BranchdagError {
    /// Id of the task this error is attributed to, if any.
    pub fn task(&self) -> Option<&str> {
        match self {
            BranchdagError::ConstraintViolation { task, .. }
            | BranchdagError::UnknownBranch { task, .. }
            | BranchdagError::BranchCardinality { task, .. }
            | BranchdagError::TaskBodyFailure { task, .. } => Some(task.as_str()),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BranchdagError>;
