// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_workflow_path;
use crate::types::FailurePolicy;

/// Command-line arguments for `rolegraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rolegraph",
    version,
    about = "Run role-based tasks in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow file (TOML).
    ///
    /// Default: `Rolegraph.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_workflow_path())]
    pub workflow: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ROLEGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print roles and tasks, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of tasks running at once (overrides the workflow file).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrency: Option<u64>,

    /// What happens to dependents of a failed task (overrides the workflow file).
    #[arg(long, value_enum, value_name = "POLICY")]
    pub policy: Option<PolicyArg>,

    /// Print the final snapshot as single-line JSON.
    #[arg(long)]
    pub compact: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum PolicyArg {
    Block,
    Cascade,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Block => FailurePolicy::Block,
            PolicyArg::Cascade => FailurePolicy::Cascade,
        }
    }
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
