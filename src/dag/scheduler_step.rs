// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::types::TaskId;

/// Structured result of a single scheduler "step".
///
/// Useful for tests that drive the scheduler by hand and want to assert on
/// what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks that moved `Blocked -> Pending` (and onto the ready queue).
    pub newly_ready: Vec<TaskId>,
    /// Tasks newly marked `Failed` in this step (the task itself plus any
    /// cascaded dependents).
    pub newly_failed: Vec<TaskId>,
    /// Whether the scheduler is quiescent after this step (nothing queued,
    /// nothing in flight).
    pub quiescent: bool,
}
