// src/workflow/mod.rs

//! Builder API for declaring workflows in code.
//!
//! The builder only produces a [`TaskGraph`](crate::dag::TaskGraph) and a
//! [`FunctionRegistry`](crate::exec::FunctionRegistry); running them is the
//! engine's job.

pub mod builder;

pub use builder::{MapReduce, TaskBuilder, Workflow};
