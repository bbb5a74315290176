// src/exec/executor.rs

//! The capability interface every role implements.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::dag::{ScheduledTask, TaskResult};

/// Why an executor did not produce a result.
///
/// The scheduler treats every variant the same way: the task becomes
/// `Failed` with `error = err.to_string()` and the run carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// Expected business failure reported by the executor.
    #[error("{0}")]
    Failed(String),

    /// The executor could not run the task at all.
    #[error("executor unavailable: {0}")]
    Unavailable(String),

    /// The executor future panicked.
    #[error("executor panicked: {0}")]
    Panicked(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

pub type ExecResult = Result<TaskResult, ExecutorError>;

/// Boxed future returned by [`Executor::execute`].
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = ExecResult> + Send + 'a>>;

/// Something that can perform tasks for one role.
///
/// One instance serves every task of its role and may be called
/// concurrently from several tasks at once.
pub trait Executor: Send + Sync {
    fn execute(&self, task: ScheduledTask) -> ExecFuture<'_>;
}
