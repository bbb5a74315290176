// src/dag/mod.rs

//! Dependency-aware scheduling core.
//!
//! - [`task`] holds the task record and the detached copy sent to executors.
//! - [`index`] tracks unresolved dependencies and reverse edges.
//! - [`queue`] is the FIFO of tasks ready for dispatch.
//! - [`scheduler`] is the single-writer state machine tying them together.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//!
//! Nothing in here is async or does IO.

pub mod index;
pub mod queue;
pub mod scheduler;
pub mod scheduler_step;
pub mod task;

pub use index::DependencyIndex;
pub use queue::ReadyQueue;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task::{ScheduledTask, Task, TaskResult};
