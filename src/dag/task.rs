// src/dag/task.rs

//! Task records owned by the scheduler, plus the detached copy handed to
//! executors.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{RoleName, TaskId, TaskStatus};

/// Opaque value produced by an executor on success.
pub type TaskResult = serde_json::Value;

/// One unit of work and its lifecycle record.
///
/// Identity fields (`id`, `role`, `description`, `dependencies`) never change
/// after submission. The lifecycle fields are only mutated by the
/// [`Scheduler`](crate::dag::Scheduler); callers get clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub role: RoleName,
    pub description: String,
    /// Direct dependencies, deduplicated, in the order they were listed.
    pub dependencies: Vec<TaskId>,
    pub status: TaskStatus,
    pub result: Option<TaskResult>,
    /// Set only when `status == Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn new(
        id: TaskId,
        role: RoleName,
        description: String,
        dependencies: Vec<TaskId>,
        status: TaskStatus,
    ) -> Self {
        Self {
            id,
            role,
            description,
            dependencies,
            status,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn mark_started(&mut self) {
        self.status = TaskStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    pub(crate) fn mark_completed(&mut self, result: TaskResult) {
        self.status = TaskStatus::Completed;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(Utc::now());
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.result = None;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
    }
}

/// A task the scheduler wants an executor to run now.
///
/// This is a detached copy: executors never see scheduler-owned records.
/// `dependency_results` carries the result of every direct dependency (all of
/// which are `Completed` at dispatch time).
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub role: RoleName,
    pub description: String,
    pub dependency_results: BTreeMap<TaskId, TaskResult>,
}

/// Deduplicate a dependency list while keeping first-seen order.
pub(crate) fn dedup_dependencies(deps: Vec<TaskId>) -> Vec<TaskId> {
    let mut seen = std::collections::HashSet::new();
    deps.into_iter().filter(|d| seen.insert(d.clone())).collect()
}
