// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::errors::Result;

/// Load a workflow definition from a given path and return the raw
/// `RawWorkflowFile`.
///
/// This only performs TOML deserialization; it does **not** check task
/// references or cycles. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Deserialize a workflow definition from TOML text.
pub fn parse_str(contents: &str) -> Result<RawWorkflowFile> {
    let raw: RawWorkflowFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a workflow definition from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - malformed ids and branch labels,
///   - unknown `after` / branch references,
///   - static dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let cfg = WorkflowFile::try_from(raw)?;
    debug!(path = %path.display(), tasks = cfg.task.len(), "loaded workflow definition");
    Ok(cfg)
}
