// src/config/mod.rs

//! Workflow file loading and validation.
//!
//! - [`model`] defines the TOML-backed data model.
//! - [`loader`] reads a workflow file from disk.
//! - [`validate`] checks roles, dependencies and acyclicity, producing a
//!   [`WorkflowFile`] only from a valid [`RawWorkflowFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_workflow_path, load_and_validate, load_from_path};
pub use model::{
    parse_duration, ConfigSection, RawWorkflowFile, RoleConfig, TaskConfig, WorkflowFile,
};
