// src/config/mod.rs

//! TOML workflow definitions.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk (`loader.rs`).
//! - Validate references and acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{RawWorkflowFile, TaskConfig, WorkflowFile, WorkflowSection};
pub use validate::validate_raw;
