// src/exec/executor.rs

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::context::ExecutionContext;
use crate::errors::Result;
use crate::exec::BodyResult;
use crate::exec::registry::FunctionRegistry;

/// Resolves a task's `func_ref` through the registry and invokes the body.
#[derive(Debug, Clone)]
pub struct Executor {
    registry: Arc<FunctionRegistry>,
}

impl Executor {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Run the body bound to `func_ref`.
    ///
    /// The outer result fails only when `func_ref` is unbound. The inner
    /// result is whatever the body returned, untouched; wrapping it is the
    /// orchestrator's job.
    pub fn execute(
        &self,
        func_ref: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<BodyResult> {
        let body = self.registry.get(func_ref)?;

        info!(
            task = %ctx.task_id(),
            name = %ctx.task_name(),
            func_ref,
            "starting task body"
        );
        let result = body.call(ctx);
        debug!(
            task = %ctx.task_id(),
            ok = result.is_ok(),
            registered = ?ctx.registered(),
            "task body returned"
        );

        Ok(result)
    }
}
