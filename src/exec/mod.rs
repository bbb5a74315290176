// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`executor`] defines the `Executor` capability interface each role
//!   implements, plus `ExecutorError`.
//! - [`registry`] binds role names to executors.
//! - [`task_runner`] spawns one dispatched task on Tokio and reports its
//!   outcome back to the coordinator via `RuntimeEvent`s.
//! - [`command`] provides `CommandExecutor`, which runs a shell command per
//!   task using `tokio::process::Command`.

pub mod command;
pub mod executor;
pub mod registry;
pub mod task_runner;

pub use command::CommandExecutor;
pub use executor::{ExecFuture, ExecResult, Executor, ExecutorError};
pub use registry::ExecutorRegistry;
pub use task_runner::{spawn_task, Dispatch};
