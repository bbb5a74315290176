// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::errors::Result;

/// Load a workflow file and return the raw, unvalidated model.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawWorkflowFile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a workflow file and validate it.
///
/// Checks that every task names a declared role, that `after` references
/// exist, that there are no cycles, and that global settings are sane.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let raw = load_from_path(&path)?;
    WorkflowFile::try_from(raw)
}

/// `Rolegraph.toml` in the current working directory.
pub fn default_workflow_path() -> PathBuf {
    PathBuf::from("Rolegraph.toml")
}
