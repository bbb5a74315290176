// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the dependency-aware [`Scheduler`](crate::dag::Scheduler)
//! - the executor registry
//! - the run loop that reacts to:
//!   - task submissions
//!   - task completion events from executors
//!   - shutdown requests
//!
//! The pure core state machine lives in [`core`]; the async shell that
//! spawns executors and waits for events is [`coordinator`]. Point-in-time
//! status reports are built in [`status`].

use std::time::Duration;

use crate::dag::TaskResult;
use crate::errors::{Result, RolegraphError};
use crate::types::TaskId;

/// Outcome of a task execution for the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(TaskResult),
    /// Human-readable failure description.
    Failed(String),
}

/// Events flowing into the run loop.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task was added; it may be ready to dispatch.
    TaskSubmitted { task: TaskId },
    /// An executor finished a task.
    TaskCompleted { task: TaskId, outcome: TaskOutcome },
}

/// Options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of tasks in flight at once. `None` = unbounded.
    pub max_concurrency: Option<usize>,
    /// How long the run loop waits for an event before re-checking state.
    pub poll_interval: Duration,
}

impl RunOptions {
    /// A limit of zero would leave ready tasks queued forever.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == Some(0) {
            return Err(RolegraphError::ConfigError(
                "max_concurrency must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Where every task ended up when a run returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<TaskId>,
    pub failed: Vec<TaskId>,
    /// Tasks whose dependencies never completed.
    pub blocked: Vec<TaskId>,
    /// Non-empty only when the run was stopped by a shutdown request.
    pub in_progress: Vec<TaskId>,
    /// Whether the run ended because of a shutdown request.
    pub interrupted: bool,
}

pub mod coordinator;
pub mod core;
pub mod event_handlers;
pub mod status;

pub use coordinator::Coordinator;
pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use status::WorkflowSnapshot;
