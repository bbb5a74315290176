// src/dag/index.rs

use std::collections::{HashMap, HashSet};

use crate::types::TaskId;

/// Tracks, per task, the dependencies that have not completed yet, plus the
/// reverse edges needed to find dependents when something completes.
///
/// Dependencies may name tasks that were never submitted; those simply stay
/// unresolved. The dependency set of a task is fixed when it is inserted.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    /// Unresolved dependencies of each task.
    remaining: HashMap<TaskId, HashSet<TaskId>>,
    /// Direct dependents: tasks that listed the key as a dependency.
    dependents: HashMap<TaskId, Vec<TaskId>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` with its dependency list.
    ///
    /// `is_completed` reports whether a dependency has already completed;
    /// those are not added to the remaining set. Returns `true` if the task
    /// has nothing left to wait for.
    pub fn insert<F>(&mut self, task: &str, deps: &[TaskId], is_completed: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        let mut remaining = HashSet::new();

        for dep in deps {
            let entry = self.dependents.entry(dep.clone()).or_default();
            if !entry.iter().any(|d| d == task) {
                entry.push(task.to_string());
            }
            if !is_completed(dep) {
                remaining.insert(dep.clone());
            }
        }

        let ready = remaining.is_empty();
        self.remaining.insert(task.to_string(), remaining);
        ready
    }

    /// Record that `completed` finished successfully.
    ///
    /// Removes it from every dependent's remaining set and returns the
    /// dependents whose remaining set became empty *by this call*. A task is
    /// returned at most once over the lifetime of the index.
    pub fn resolve(&mut self, completed: &str) -> Vec<TaskId> {
        let mut unblocked = Vec::new();

        for dependent in self.dependents_of(completed).to_vec() {
            if let Some(remaining) = self.remaining.get_mut(&dependent) {
                if remaining.remove(completed) && remaining.is_empty() {
                    unblocked.push(dependent);
                }
            }
        }

        unblocked
    }

    /// Unresolved dependencies of `task`, or `None` if the task is unknown.
    pub fn remaining_of(&self, task: &str) -> Option<&HashSet<TaskId>> {
        self.remaining.get(task)
    }

    /// Whether `task` is known and has no unresolved dependencies.
    pub fn is_resolved(&self, task: &str) -> bool {
        self.remaining
            .get(task)
            .map(|r| r.is_empty())
            .unwrap_or(false)
    }

    /// Immediate dependents of a task (tasks that list it as a dependency).
    pub fn dependents_of(&self, task: &str) -> &[TaskId] {
        self.dependents
            .get(task)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }
}
