// src/dag/scheduler.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::index::DependencyIndex;
use crate::dag::queue::ReadyQueue;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task::{dedup_dependencies, ScheduledTask, Task};
use crate::engine::TaskOutcome;
use crate::errors::{Result, RolegraphError};
use crate::types::{FailurePolicy, TaskId, TaskStatus};

/// Single-writer scheduling state machine.
///
/// Owns every task record, the dependency index, the ready queue and the
/// in-flight set. It is synchronous and does no IO; the async
/// [`Coordinator`](crate::engine::Coordinator) serializes all access to it.
///
/// It is responsible for:
/// - computing the initial status of submitted tasks
/// - handing out ready tasks exactly once (`Pending -> InProgress`)
/// - recording completions and failures
/// - unblocking dependents on success (and cascading failures if configured)
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<TaskId, Task>,
    index: DependencyIndex,
    queue: ReadyQueue,
    in_flight: HashSet<TaskId>,
    policy: FailurePolicy,
}

impl Scheduler {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Add a task.
    ///
    /// The initial status is `Pending` (and the task is queued) when every
    /// dependency has already completed, otherwise `Blocked`. Dependencies on
    /// ids that were never submitted count as unresolved.
    ///
    /// Role validation is the caller's job; this only rejects duplicate ids.
    pub fn submit(
        &mut self,
        id: &str,
        role: &str,
        description: &str,
        dependencies: Vec<TaskId>,
    ) -> Result<Task> {
        if self.tasks.contains_key(id) {
            return Err(RolegraphError::DuplicateTaskId(id.to_string()));
        }

        let deps = dedup_dependencies(dependencies);
        let tasks = &self.tasks;
        let ready = self.index.insert(id, &deps, |dep| {
            tasks
                .get(dep)
                .map(|t| t.status == TaskStatus::Completed)
                .unwrap_or(false)
        });

        let failed_dep = match self.policy {
            FailurePolicy::Cascade => deps
                .iter()
                .find(|d| self.status_of(d) == Some(TaskStatus::Failed))
                .cloned(),
            FailurePolicy::Block => None,
        };

        let status = if ready {
            TaskStatus::Pending
        } else {
            TaskStatus::Blocked
        };

        let mut task = Task::new(
            id.to_string(),
            role.to_string(),
            description.to_string(),
            deps,
            status,
        );

        if let Some(dep) = failed_dep {
            debug!(task = %id, dep = %dep, "dependency already failed; failing on submission");
            task.mark_failed(dependency_failed_message(&dep));
        } else if ready {
            self.queue.push(id);
        }

        debug!(task = %id, role = %role, status = %task.status, "task submitted");
        self.tasks.insert(id.to_string(), task.clone());

        // Tasks submitted earlier may already depend on this id.
        if task.status == TaskStatus::Failed {
            self.cascade_failure(id);
        }

        Ok(task)
    }

    /// Pop up to `limit` ready tasks, mark them `InProgress` and in-flight,
    /// and return the detached copies to hand to executors.
    ///
    /// `limit` is the number of free execution slots (`None` = unbounded).
    pub fn dispatch_ready(&mut self, limit: Option<usize>) -> Vec<ScheduledTask> {
        let mut dispatched = Vec::new();

        for id in self.queue.drain_up_to(limit) {
            let Some(task) = self.tasks.get_mut(&id) else {
                warn!(task = %id, "queued task missing from task map; skipping");
                continue;
            };

            if task.status != TaskStatus::Pending || self.in_flight.contains(&id) {
                warn!(task = %id, status = %task.status, "queued task not dispatchable; skipping");
                continue;
            }

            task.mark_started();
            self.in_flight.insert(id.clone());
            info!(task = %id, role = %task.role, "dispatching task");

            let deps = task.dependencies.clone();
            let role = task.role.clone();
            let description = task.description.clone();

            dispatched.push(ScheduledTask {
                dependency_results: self.dependency_results(&deps),
                id,
                role,
                description,
            });
        }

        dispatched
    }

    /// Record the outcome of an in-flight task.
    ///
    /// Completions for tasks that are not in flight (unknown, or already
    /// resolved) are ignored, which keeps a task's terminal state final.
    pub fn handle_completion(&mut self, id: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        if !self.in_flight.remove(id) {
            warn!(task = %id, "completion for task that is not in flight; ignoring");
            step.quiescent = self.is_quiescent();
            return step;
        }

        let Some(task) = self.tasks.get_mut(id) else {
            warn!(task = %id, "in-flight task missing from task map");
            step.quiescent = self.is_quiescent();
            return step;
        };

        match outcome {
            TaskOutcome::Success(result) => {
                task.mark_completed(result);
                info!(task = %id, role = %task.role, "task completed");
                step.newly_ready = self.unblock_dependents(id);
            }
            TaskOutcome::Failed(error) => {
                warn!(task = %id, role = %task.role, error = %error, "task failed");
                task.mark_failed(error);
                step.newly_failed.push(id.to_string());
                if self.policy == FailurePolicy::Cascade {
                    step.newly_failed.extend(self.cascade_failure(id));
                }
            }
        }

        step.quiescent = self.is_quiescent();
        step
    }

    /// Nothing is queued and nothing is in flight.
    ///
    /// `Blocked` tasks cannot change state without a completion, so once the
    /// scheduler is quiescent they are permanently blocked for this run.
    pub fn is_quiescent(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.get(id).map(|t| t.status)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &TaskId> {
        self.in_flight.iter()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = &TaskId> {
        self.queue.iter()
    }

    /// Unresolved dependencies of `id`, sorted. `None` if the task is unknown.
    pub fn remaining_dependencies(&self, id: &str) -> Option<Vec<TaskId>> {
        let mut remaining: Vec<TaskId> = self.index.remaining_of(id)?.iter().cloned().collect();
        remaining.sort();
        Some(remaining)
    }

    /// Whether every dependency of `id` has completed. `None` if unknown.
    pub fn deps_satisfied(&self, id: &str) -> Option<bool> {
        self.tasks.get(id)?;
        Some(self.index.is_resolved(id))
    }

    /// Ids of all tasks currently in `status`, sorted.
    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status == status)
            .map(|t| t.id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn unblock_dependents(&mut self, completed: &str) -> Vec<TaskId> {
        let mut newly_ready = Vec::new();

        for dependent in self.index.resolve(completed) {
            if let Some(task) = self.tasks.get_mut(&dependent) {
                if task.status == TaskStatus::Blocked {
                    task.status = TaskStatus::Pending;
                    self.queue.push(&dependent);
                    debug!(task = %dependent, unblocked_by = %completed, "dependencies satisfied; marking Pending");
                    newly_ready.push(dependent);
                }
            }
        }

        newly_ready
    }

    /// Mark every waiting transitive dependent of `failed_task` as `Failed`.
    ///
    /// Returns the tasks newly failed (excluding `failed_task` itself).
    fn cascade_failure(&mut self, failed_task: &str) -> Vec<TaskId> {
        let mut stack: Vec<(TaskId, TaskId)> = self
            .index
            .dependents_of(failed_task)
            .iter()
            .map(|d| (d.clone(), failed_task.to_string()))
            .collect();

        let mut newly_failed = Vec::new();

        while let Some((name, cause)) = stack.pop() {
            if let Some(task) = self.tasks.get_mut(&name) {
                match task.status {
                    TaskStatus::Blocked | TaskStatus::Pending => {
                        task.mark_failed(dependency_failed_message(&cause));
                        debug!(
                            task = %name,
                            dependency = %cause,
                            "marking dependent as Failed due to upstream failure"
                        );
                        newly_failed.push(name.clone());
                        stack.extend(
                            self.index
                                .dependents_of(&name)
                                .iter()
                                .map(|d| (d.clone(), name.clone())),
                        );
                    }
                    TaskStatus::InProgress | TaskStatus::Completed | TaskStatus::Failed => {
                        // Already running or terminal.
                    }
                }
            }
        }

        newly_failed
    }

    fn dependency_results(&self, deps: &[TaskId]) -> BTreeMap<TaskId, serde_json::Value> {
        deps.iter()
            .filter_map(|dep| {
                let result = self.tasks.get(dep)?.result.clone()?;
                Some((dep.clone(), result))
            })
            .collect()
    }
}

fn dependency_failed_message(dep: &str) -> String {
    format!("dependency '{dep}' failed")
}
