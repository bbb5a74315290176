// src/engine/status.rs

//! Point-in-time status reports.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::dag::{Scheduler, Task};
use crate::types::{RoleName, TaskId, TaskStatus};

/// Number of tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub blocked: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    fn record(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::Blocked => self.blocked += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
            TaskStatus::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.blocked + self.in_progress + self.completed + self.failed
    }
}

/// Consistent copy of every task plus registry and in-flight state.
///
/// Captured while the core is locked, so each task appears entirely in
/// either its old or its new status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub tasks: BTreeMap<TaskId, Task>,
    pub roles: BTreeSet<RoleName>,
    pub in_flight: BTreeSet<TaskId>,
    pub counts: StatusCounts,
}

impl WorkflowSnapshot {
    pub fn capture<'a>(scheduler: &Scheduler, roles: impl Iterator<Item = &'a str>) -> Self {
        let mut counts = StatusCounts::default();
        let tasks = scheduler
            .tasks()
            .map(|task| {
                counts.record(task.status);
                (task.id.clone(), task.clone())
            })
            .collect();

        Self {
            tasks,
            roles: roles.map(str::to_string).collect(),
            in_flight: scheduler.in_flight().cloned().collect(),
            counts,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.get(id).map(|t| t.status)
    }

    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.status == status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::engine::TaskOutcome;
    use crate::types::FailurePolicy;

    #[test]
    fn snapshot_serializes_statuses_and_timestamps() {
        let mut s = Scheduler::new(FailurePolicy::Block);
        s.submit("a", "r", "first", vec![]).unwrap();
        s.submit("b", "r", "second", vec!["a".into()]).unwrap();
        s.dispatch_ready(None);
        s.handle_completion("a", TaskOutcome::Success(json!({"ok": true})));
        s.dispatch_ready(None);

        let snap = WorkflowSnapshot::capture(&s, ["r"].into_iter());
        assert_eq!(snap.counts.completed, 1);
        assert_eq!(snap.counts.in_progress, 1);
        assert_eq!(snap.counts.total(), 2);
        assert!(snap.in_flight.contains("b"));

        let value = serde_json::to_value(&snap).unwrap();
        assert_eq!(value["tasks"]["a"]["status"], "completed");
        assert_eq!(value["tasks"]["b"]["status"], "in_progress");
        assert_eq!(value["tasks"]["a"]["result"], json!({"ok": true}));
        assert_eq!(value["roles"], json!(["r"]));

        let created = value["tasks"]["a"]["created_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn snapshot_is_detached_from_scheduler() {
        let mut s = Scheduler::new(FailurePolicy::Block);
        s.submit("a", "r", "", vec![]).unwrap();
        let before = WorkflowSnapshot::capture(&s, std::iter::empty());

        s.dispatch_ready(None);
        assert_eq!(before.status_of("a"), Some(TaskStatus::Pending));
        assert!(before.in_flight.is_empty());
    }
}
