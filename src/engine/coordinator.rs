// src/engine/coordinator.rs

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Notify};
use tracing::{debug, info};

use crate::dag::Task;
use crate::engine::core::CoreRuntime;
use crate::engine::status::WorkflowSnapshot;
use crate::engine::{CoreCommand, CoreStep, RunOptions, RunSummary, RuntimeEvent};
use crate::errors::{Result, RolegraphError};
use crate::exec::{spawn_task, Executor};
use crate::types::{FailurePolicy, TaskId};

/// Async shell around [`CoreRuntime`].
///
/// All scheduler state sits behind one mutex and is only touched through
/// the core, so `register`, `submit`, `snapshot` and the run loop are safe
/// to call from any task. Executors run in their own Tokio tasks and report
/// back over the event channel; the lock is never held across an executor
/// call.
pub struct Coordinator {
    core: Mutex<CoreRuntime>,
    events_tx: mpsc::UnboundedSender<RuntimeEvent>,
    events_rx: Mutex<mpsc::UnboundedReceiver<RuntimeEvent>>,
    /// Wakes the active run loop; requests made while no loop runs are dropped.
    shutdown: Notify,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator").finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Fails with `ConfigError` if `options` carry a zero concurrency limit.
    pub fn new(policy: FailurePolicy, options: RunOptions) -> Result<Self> {
        let core = CoreRuntime::new(policy, options)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            core: Mutex::new(core),
            events_tx,
            events_rx: Mutex::new(events_rx),
            shutdown: Notify::new(),
        })
    }

    /// Bind an executor to a role. Fails with `DuplicateRole` if the role is
    /// already bound.
    pub async fn register(&self, role: &str, executor: Arc<dyn Executor>) -> Result<()> {
        self.core.lock().await.register(role, executor)
    }

    /// Add a task. Submission errors are returned here and never reach the
    /// run loop.
    pub async fn submit(
        &self,
        role: &str,
        description: &str,
        id: &str,
        dependencies: Vec<TaskId>,
    ) -> Result<Task> {
        let task = self
            .core
            .lock()
            .await
            .submit(role, description, id, dependencies)?;

        // Wakes a running loop; harmless when nothing is running yet.
        let _ = self.events_tx.send(RuntimeEvent::TaskSubmitted {
            task: task.id.clone(),
        });
        Ok(task)
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.core.lock().await.snapshot()
    }

    pub async fn task(&self, id: &str) -> Option<Task> {
        self.core.lock().await.scheduler().task(id).cloned()
    }

    /// Ask the running loop to stop dispatching and return. Has no effect
    /// when no loop is running; it does not carry over to a later run.
    pub fn request_shutdown(&self) {
        self.shutdown.notify_waiters();
    }

    /// Run until nothing is queued or in flight.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_until(future::pending::<()>()).await
    }

    /// Run until quiescence or until `shutdown` resolves, whichever comes
    /// first. Tasks still executing at shutdown stay `InProgress`; their
    /// completions are picked up by the next run.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let mut events_rx = self
            .events_rx
            .try_lock()
            .map_err(|_| RolegraphError::Other(anyhow::anyhow!("run loop already active")))?;
        tokio::pin!(shutdown);

        // Registered before the first dispatch, so a request made at any
        // point during this run is seen.
        let stop_requested = self.shutdown.notified();
        tokio::pin!(stop_requested);
        stop_requested.as_mut().enable();

        let poll_interval = self.core.lock().await.options().poll_interval;
        info!(?poll_interval, "run loop started");

        let mut interrupted = false;
        let mut step = self.core.lock().await.poll();

        loop {
            self.execute_commands(&mut step);
            if !step.keep_running {
                break;
            }

            let event = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested; no further dispatch");
                    interrupted = true;
                    break;
                }
                _ = &mut stop_requested => {
                    info!("shutdown requested through coordinator; no further dispatch");
                    interrupted = true;
                    break;
                }
                event = tokio::time::timeout(poll_interval, events_rx.recv()) => event,
            };

            step = match event {
                Ok(Some(event)) => {
                    debug!(?event, "run loop received event");
                    self.core.lock().await.step(event)
                }
                // The coordinator holds a sender, so the channel stays open.
                Ok(None) => break,
                Err(_elapsed) => self.core.lock().await.poll(),
            };
        }

        let summary = self.core.lock().await.summary(interrupted);
        info!(
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            blocked = summary.blocked.len(),
            in_progress = summary.in_progress.len(),
            interrupted,
            "run loop finished"
        );
        Ok(summary)
    }

    fn execute_commands(&self, step: &mut CoreStep) {
        for command in step.commands.drain(..) {
            match command {
                CoreCommand::DispatchTasks(dispatches) => {
                    for dispatch in dispatches {
                        spawn_task(dispatch, self.events_tx.clone());
                    }
                }
                CoreCommand::RequestExit => debug!("core reports quiescence"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::dag::ScheduledTask;
    use crate::exec::{ExecFuture, ExecutorError};
    use crate::types::TaskStatus;

    struct Echo;

    impl Executor for Echo {
        fn execute(&self, task: ScheduledTask) -> ExecFuture<'_> {
            Box::pin(async move {
                if task.description == "boom" {
                    return Err(ExecutorError::Failed("exploded".into()));
                }
                Ok(json!({ "echo": task.description }))
            })
        }
    }

    async fn coordinator() -> Coordinator {
        let c = Coordinator::new(FailurePolicy::default(), RunOptions::default()).unwrap();
        c.register("r", Arc::new(Echo)).await.unwrap();
        c
    }

    #[tokio::test]
    async fn run_with_no_tasks_returns_immediately() {
        let c = coordinator().await;
        let summary = c.run().await.unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn zero_concurrency_limit_is_rejected() {
        let options = RunOptions {
            max_concurrency: Some(0),
            ..RunOptions::default()
        };
        let err = Coordinator::new(FailurePolicy::Block, options).unwrap_err();
        assert!(matches!(err, RolegraphError::ConfigError(_)));
    }

    #[tokio::test]
    async fn shutdown_request_without_a_running_loop_is_not_kept() {
        let c = coordinator().await;
        c.request_shutdown();
        c.submit("r", "ok", "a", vec![]).await.unwrap();

        let summary = tokio::time::timeout(Duration::from_secs(5), c.run())
            .await
            .unwrap()
            .unwrap();
        assert!(!summary.interrupted);
        assert_eq!(summary.completed, vec!["a"]);
        assert!(summary.in_progress.is_empty());
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let c = coordinator().await;
        let err = c.register("r", Arc::new(Echo)).await.unwrap_err();
        assert!(matches!(err, RolegraphError::DuplicateRole(r) if r == "r"));
    }

    #[tokio::test]
    async fn failure_is_recorded_and_run_terminates() {
        let c = coordinator().await;
        c.submit("r", "ok", "a", vec![]).await.unwrap();
        c.submit("r", "boom", "b", vec![]).await.unwrap();

        let summary = c.run().await.unwrap();
        assert_eq!(summary.completed, vec!["a"]);
        assert_eq!(summary.failed, vec!["b"]);

        let b = c.task("b").await.unwrap();
        assert_eq!(b.status, TaskStatus::Failed);
        assert_eq!(b.error.as_deref(), Some("exploded"));
        assert!(b.completed_at.is_some());
    }

    #[tokio::test]
    async fn second_run_picks_up_new_submissions() {
        let c = coordinator().await;
        c.submit("r", "one", "a", vec![]).await.unwrap();
        c.run().await.unwrap();

        c.submit("r", "two", "b", vec!["a".into()]).await.unwrap();
        let summary = c.run().await.unwrap();
        assert_eq!(summary.completed, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn resolved_shutdown_stops_before_dispatch() {
        let c = coordinator().await;
        c.submit("r", "never", "a", vec![]).await.unwrap();

        // Biased select checks shutdown first, but the initial poll has
        // already dispatched `a`.
        let summary = tokio::time::timeout(Duration::from_secs(5), c.run_until(async {}))
            .await
            .unwrap()
            .unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.in_progress, vec!["a"]);
    }
}
