// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, warn};

use crate::dag::Scheduler;
use crate::engine::{RunOptions, TaskOutcome};
use crate::exec::{Dispatch, ExecutorError, ExecutorRegistry};
use crate::types::TaskId;

/// Command produced by the pure core, to be executed by the async shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Spawn these tasks on their executors.
    DispatchTasks(Vec<Dispatch>),
    /// Nothing is queued or in flight; the run is over.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer run loop should keep running.
    pub keep_running: bool,
}

/// Handle a task completion event, then dispatch whatever became ready.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    registry: &ExecutorRegistry,
    options: &RunOptions,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.handle_completion(&task, outcome);
    if !step.newly_ready.is_empty() {
        debug!(task = %task, unblocked = ?step.newly_ready, "dependents unblocked");
    }
    if step.newly_failed.len() > 1 {
        debug!(task = %task, failed = ?step.newly_failed, "failure cascaded to dependents");
    }
    dispatch_and_check(scheduler, registry, options)
}

/// Pull as many ready tasks as the concurrency limit allows and pair each
/// with its executor. Ends the run when nothing is queued or in flight.
pub fn dispatch_and_check(
    scheduler: &mut Scheduler,
    registry: &ExecutorRegistry,
    options: &RunOptions,
) -> CoreStep {
    let mut commands = Vec::new();

    let dispatches = collect_dispatches(scheduler, registry, options);
    if !dispatches.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatches));
    }

    let keep_running = !scheduler.is_quiescent();
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn collect_dispatches(
    scheduler: &mut Scheduler,
    registry: &ExecutorRegistry,
    options: &RunOptions,
) -> Vec<Dispatch> {
    let mut dispatches = Vec::new();

    // A missing executor fails the task immediately, which may free a slot
    // or unblock nothing; loop until no more progress is possible.
    loop {
        let slots = options
            .max_concurrency
            .map(|max| max.saturating_sub(scheduler.in_flight_count()));
        if slots == Some(0) {
            break;
        }

        let scheduled = scheduler.dispatch_ready(slots);
        if scheduled.is_empty() {
            break;
        }

        for task in scheduled {
            match registry.get(&task.role) {
                Some(executor) => dispatches.push(Dispatch { task, executor }),
                None => {
                    warn!(task = %task.id, role = %task.role, "no executor bound to role");
                    let error = ExecutorError::Unavailable(format!(
                        "no executor registered for role '{}'",
                        task.role
                    ));
                    scheduler.handle_completion(&task.id, TaskOutcome::Failed(error.to_string()));
                }
            }
        }
    }

    dispatches
}
