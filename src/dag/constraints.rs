// src/dag/constraints.rs

use tracing::debug;

use crate::dag::resolver::DependencyResolver;
use crate::dag::spec::TaskSpec;
use crate::errors::{BranchdagError, Result};
use crate::types::Constraint;

/// Checks a task's declared constraints against the static graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

impl ConstraintValidator {
    /// Validate every constraint of `task`, in declared order.
    ///
    /// The first violation is returned as
    /// [`BranchdagError::ConstraintViolation`].
    pub fn validate(resolver: &DependencyResolver, task: &TaskSpec) -> Result<()> {
        for &constraint in task.constraints.iter() {
            if !Self::holds(resolver, task, constraint) {
                return Err(BranchdagError::ConstraintViolation {
                    task: task.id.clone(),
                    name: task.name.clone(),
                    constraint,
                });
            }
            debug!(task = %task.id, %constraint, "constraint satisfied");
        }
        Ok(())
    }

    fn holds(resolver: &DependencyResolver, task: &TaskSpec, constraint: Constraint) -> bool {
        match constraint {
            Constraint::MustBeStatic => !task.is_activator(),
            Constraint::MustHaveNoOutgoingEdges => resolver.successors(&task.id).is_empty(),
            Constraint::MustHaveNoIncomingEdges => task.deps.is_empty(),
        }
    }
}
