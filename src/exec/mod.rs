// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`body`] defines the [`TaskBody`] trait and closure adapters.
//! - [`registry`] maps `func_ref` keys to bodies.
//! - [`executor`] resolves and invokes a task's body.
//! - [`backend`] provides the `ExecutorBackend` trait used by the async
//!   runtime and a `BlockingExecutorBackend` that runs bodies on Tokio's
//!   blocking pool.

pub mod backend;
pub mod body;
pub mod executor;
pub mod registry;

pub use backend::{BlockingExecutorBackend, ExecutorBackend};
pub use body::{BodyRef, BranchingBody, FnBody, NoopBody, TaskBody, body_fn, branching_fn, noop};
pub use executor::Executor;
pub use registry::FunctionRegistry;

/// What a body invocation produced: an optional output value, or the body's
/// own error.
pub type BodyResult = anyhow::Result<Option<toml::Value>>;
