// src/config/validate.rs

use regex::Regex;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::dag::{DependencyResolver, TaskGraph};
use crate::errors::{BranchdagError, Result};
use crate::types::BranchDiscipline;

/// Task ids and branch labels must look like identifiers.
const IDENT_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.-]*$";

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = crate::errors::BranchdagError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw(&raw)?;
        Ok(WorkflowFile::new_unchecked(raw.workflow, raw.task))
    }
}

/// Run every check on a raw definition.
pub fn validate_raw(cfg: &RawWorkflowFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_workflow_section(cfg)?;
    validate_identifiers(cfg)?;
    validate_task_references(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawWorkflowFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BranchdagError::ConfigError(
            "workflow must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow_section(cfg: &RawWorkflowFile) -> Result<()> {
    // discipline and constraints are strongly typed and rejected during
    // deserialization, so only numeric bounds remain.
    if cfg.workflow.max_in_flight == 0 {
        return Err(BranchdagError::ConfigError(
            "[workflow].max_in_flight must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_identifiers(cfg: &RawWorkflowFile) -> Result<()> {
    let ident = Regex::new(IDENT_PATTERN)
        .map_err(|e| BranchdagError::ConfigError(format!("invalid identifier pattern: {e}")))?;

    for (id, task) in cfg.task.iter() {
        if !ident.is_match(id) {
            return Err(BranchdagError::ConfigError(format!(
                "task id '{id}' must match {IDENT_PATTERN}"
            )));
        }
        for label in task.branches.keys() {
            if !ident.is_match(label) {
                return Err(BranchdagError::ConfigError(format!(
                    "branch label '{label}' of task '{id}' must match {IDENT_PATTERN}"
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_references(cfg: &RawWorkflowFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == id {
                return Err(BranchdagError::ConfigError(format!(
                    "task '{id}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(BranchdagError::ConfigError(format!(
                    "task '{id}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }

        if task.discipline == BranchDiscipline::ExactlyOne && task.branches.is_empty() {
            return Err(BranchdagError::ConfigError(format!(
                "task '{id}' sets discipline exactly_one but declares no branches"
            )));
        }

        for (label, target) in task.branches.iter() {
            if target == id {
                return Err(BranchdagError::ConfigError(format!(
                    "task '{id}' cannot activate itself through branch '{label}'"
                )));
            }
            if !cfg.task.contains_key(target) {
                return Err(BranchdagError::ConfigError(format!(
                    "branch '{label}' of task '{id}' points to unknown task '{target}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawWorkflowFile) -> Result<()> {
    // References were checked above, so freezing cannot fail on them.
    let graph = TaskGraph::new(cfg.specs())?;
    let cycles = DependencyResolver::build(&graph).static_cycles();

    if cycles.is_empty() {
        return Ok(());
    }

    let mut pending: Vec<String> = cycles.into_iter().flatten().collect();
    pending.sort();
    Err(BranchdagError::CycleOrDeadlock { pending })
}
