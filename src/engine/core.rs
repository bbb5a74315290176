// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! [`CoreRuntime`] consumes [`RuntimeEvent`]s and produces an updated state
//! plus a list of commands for the IO shell. It owns the scheduler and the
//! executor registry and has no channels, no Tokio types, and does no IO,
//! so it can be unit tested directly.

use std::sync::Arc;

use crate::dag::{Scheduler, Task};
use crate::engine::event_handlers::{dispatch_and_check, handle_task_completion, CoreStep};
use crate::engine::status::WorkflowSnapshot;
use crate::engine::{RunOptions, RunSummary, RuntimeEvent};
use crate::errors::{Result, RolegraphError};
use crate::exec::{Executor, ExecutorRegistry};
use crate::types::{FailurePolicy, RoleName, TaskId, TaskStatus};

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    registry: ExecutorRegistry,
    options: RunOptions,
}

impl CoreRuntime {
    /// Fails with `ConfigError` if `options` are unusable (a zero
    /// concurrency limit).
    pub fn new(policy: FailurePolicy, options: RunOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            scheduler: Scheduler::new(policy),
            registry: ExecutorRegistry::new(),
            options,
        })
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn register(&mut self, role: &str, executor: Arc<dyn Executor>) -> Result<()> {
        self.registry.register(role, executor)
    }

    /// Validate the role and hand the task to the scheduler.
    pub fn submit(
        &mut self,
        role: &str,
        description: &str,
        id: &str,
        dependencies: Vec<TaskId>,
    ) -> Result<Task> {
        if !self.registry.contains(role) {
            return Err(RolegraphError::UnknownRole(role.to_string()));
        }
        self.scheduler.submit(id, role, description, dependencies)
    }

    /// Dispatch whatever is ready without an incoming event (run start and
    /// poll timeouts).
    pub fn poll(&mut self) -> CoreStep {
        dispatch_and_check(&mut self.scheduler, &self.registry, &self.options)
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskSubmitted { .. } => self.poll(),
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &self.registry,
                &self.options,
                task,
                outcome,
            ),
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot::capture(&self.scheduler, self.registry.roles())
    }

    pub fn summary(&self, interrupted: bool) -> RunSummary {
        let s = &self.scheduler;
        RunSummary {
            completed: s.ids_with_status(TaskStatus::Completed),
            failed: s.ids_with_status(TaskStatus::Failed),
            blocked: s.ids_with_status(TaskStatus::Blocked),
            in_progress: s.ids_with_status(TaskStatus::InProgress),
            interrupted,
        }
    }

    pub fn roles(&self) -> Vec<RoleName> {
        let mut roles: Vec<RoleName> = self.registry.roles().map(str::to_string).collect();
        roles.sort();
        roles
    }
}
