// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Submission-time failures (`UnknownRole`, `DuplicateTaskId`,
//! `DuplicateRole`) are returned synchronously to the caller. Failures that
//! happen while a task executes never surface here; they are recorded on the
//! task itself (see [`crate::exec::ExecutorError`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RolegraphError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("Role already registered: {0}")]
    DuplicateRole(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in workflow: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RolegraphError>;
