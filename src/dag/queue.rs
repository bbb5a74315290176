// src/dag/queue.rs

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::types::TaskId;

/// FIFO of tasks whose dependencies are satisfied and that are waiting for
/// dispatch.
///
/// A task id is held at most once; pushing an id that is already queued is a
/// no-op. Ordering beyond FIFO-by-enqueue is not guaranteed to callers.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    order: VecDeque<TaskId>,
    queued: HashSet<TaskId>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, task: &str) -> bool {
        self.queued.contains(task)
    }

    /// Enqueue a ready task. Returns `false` if it was already queued.
    pub fn push(&mut self, task: &str) -> bool {
        if !self.queued.insert(task.to_string()) {
            debug!(task = %task, "task already on ready queue; ignoring");
            return false;
        }
        self.order.push_back(task.to_string());
        true
    }

    /// Dequeue the oldest ready task.
    pub fn pop(&mut self) -> Option<TaskId> {
        let task = self.order.pop_front()?;
        self.queued.remove(&task);
        Some(task)
    }

    /// Dequeue up to `max` tasks (all of them if `max` is `None`).
    pub fn drain_up_to(&mut self, max: Option<usize>) -> Vec<TaskId> {
        let n = max.unwrap_or(self.order.len()).min(self.order.len());
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(task) = self.pop() {
                out.push(task);
            }
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskId> {
        self.order.iter()
    }
}
