// src/exec/body.rs

//! Task bodies: the code a task actually runs.

use std::fmt;
use std::sync::Arc;

use crate::engine::context::{BranchSelection, ExecutionContext};

/// Something the executor can invoke for a task.
///
/// A body may return a value, which the orchestrator stores in the run's
/// shared outputs. Errors are reported back unmodified and abort the run.
pub trait TaskBody: Send + Sync {
    fn call(&self, ctx: &mut ExecutionContext) -> anyhow::Result<Option<toml::Value>>;
}

/// Shared handle to a registered body.
pub type BodyRef = Arc<dyn TaskBody>;

/// Plain closure body.
pub struct FnBody<F> {
    f: F,
}

impl<F> TaskBody for FnBody<F>
where
    F: Fn(&mut ExecutionContext) -> anyhow::Result<Option<toml::Value>> + Send + Sync,
{
    fn call(&self, ctx: &mut ExecutionContext) -> anyhow::Result<Option<toml::Value>> {
        (self.f)(ctx)
    }
}

impl<F> fmt::Debug for FnBody<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBody").finish_non_exhaustive()
    }
}

/// Activator body: the selector's [`BranchSelection`] is turned into
/// `register_branches` calls on the context.
pub struct BranchingBody<F> {
    selector: F,
}

impl<F> TaskBody for BranchingBody<F>
where
    F: Fn(&mut ExecutionContext) -> anyhow::Result<BranchSelection> + Send + Sync,
{
    fn call(&self, ctx: &mut ExecutionContext) -> anyhow::Result<Option<toml::Value>> {
        let selection = (self.selector)(ctx)?;
        ctx.select(selection)?;
        Ok(None)
    }
}

impl<F> fmt::Debug for BranchingBody<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchingBody").finish_non_exhaustive()
    }
}

/// Body that does nothing; used for structural tasks such as the
/// map/reduce initiator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBody;

impl TaskBody for NoopBody {
    fn call(&self, _ctx: &mut ExecutionContext) -> anyhow::Result<Option<toml::Value>> {
        Ok(None)
    }
}

pub fn body_fn<F>(f: F) -> BodyRef
where
    F: Fn(&mut ExecutionContext) -> anyhow::Result<Option<toml::Value>> + Send + Sync + 'static,
{
    Arc::new(FnBody { f })
}

pub fn branching_fn<F>(selector: F) -> BodyRef
where
    F: Fn(&mut ExecutionContext) -> anyhow::Result<BranchSelection> + Send + Sync + 'static,
{
    Arc::new(BranchingBody { selector })
}

pub fn noop() -> BodyRef {
    Arc::new(NoopBody)
}
