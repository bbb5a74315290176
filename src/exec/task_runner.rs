// src/exec/task_runner.rs

//! Runs a single dispatched task on the Tokio runtime and reports the
//! outcome back to the coordinator as a `RuntimeEvent`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::{ExecResult, Executor, ExecutorError};

/// A ready task paired with the executor bound to its role.
#[derive(Clone)]
pub struct Dispatch {
    pub task: ScheduledTask,
    pub executor: Arc<dyn Executor>,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

/// Spawn the executor call in its own Tokio task.
///
/// The executor runs inside a nested task so a panic is caught as a
/// `JoinError` and reported as a failure instead of taking the run down.
/// Exactly one `TaskCompleted` event is sent per dispatch.
pub fn spawn_task(dispatch: Dispatch, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) {
    let task_id = dispatch.task.id.clone();

    tokio::spawn(async move {
        let Dispatch { task, executor } = dispatch;
        let inner = tokio::spawn(async move { executor.execute(task).await });

        let result: ExecResult = match inner.await {
            Ok(result) => result,
            Err(join_err) => {
                error!(task = %task_id, error = %join_err, "executor task aborted");
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    join_err.to_string()
                };
                Err(ExecutorError::Panicked(message))
            }
        };

        let outcome = match result {
            Ok(value) => TaskOutcome::Success(value),
            Err(err) => TaskOutcome::Failed(err.to_string()),
        };

        if runtime_tx
            .send(RuntimeEvent::TaskCompleted {
                task: task_id.clone(),
                outcome,
            })
            .is_err()
        {
            debug!(task = %task_id, "coordinator gone; dropping completion");
        }
    });
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
