use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;
use rolegraph::dag::ScheduledTask;
use rolegraph::exec::{ExecFuture, Executor, ExecutorError};
use rolegraph::types::TaskId;

/// One finished `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub task: ScheduledTask,
    pub started: Instant,
    pub finished: Instant,
}

/// Shared, cloneable log of every call a [`FakeExecutor`] handled.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
}

impl ExecutionLog {
    fn push(&self, record: ExecutionRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Task ids in the order their executions finished.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.records().into_iter().map(|r| r.task.id).collect()
    }

    pub fn count_for(&self, id: &str) -> usize {
        self.records().iter().filter(|r| r.task.id == id).count()
    }

    pub fn record_for(&self, id: &str) -> Option<ExecutionRecord> {
        self.records().into_iter().find(|r| r.task.id == id)
    }

    /// Whether the execution windows of `a` and `b` intersect.
    pub fn overlapped(&self, a: &str, b: &str) -> bool {
        match (self.record_for(a), self.record_for(b)) {
            (Some(a), Some(b)) => a.started < b.finished && b.started < a.finished,
            _ => false,
        }
    }
}

/// Configurable in-process executor.
///
/// - records every call in an [`ExecutionLog`]
/// - sleeps for `delay` before answering
/// - fails or panics for selected task ids
/// - tracks the peak number of concurrent calls
///
/// Successful calls return `{"task": id, "role": role, "inputs": [dep ids]}`.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    log: ExecutionLog,
    delay: Duration,
    failures: HashMap<TaskId, String>,
    panics: HashSet<TaskId>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, id: &str, message: &str) -> Self {
        self.failures.insert(id.to_string(), message.to_string());
        self
    }

    pub fn panicking(mut self, id: &str) -> Self {
        self.panics.insert(id.to_string());
        self
    }

    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    /// Highest number of `execute` calls observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Executor for FakeExecutor {
    fn execute(&self, task: ScheduledTask) -> ExecFuture<'_> {
        Box::pin(async move {
            let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_running, Ordering::SeqCst);
            let started = Instant::now();

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.running.fetch_sub(1, Ordering::SeqCst);
            self.log.push(ExecutionRecord {
                task: task.clone(),
                started,
                finished: Instant::now(),
            });

            if self.panics.contains(&task.id) {
                panic!("fake executor panic for {}", task.id);
            }
            if let Some(message) = self.failures.get(&task.id) {
                return Err(ExecutorError::Failed(message.clone()));
            }

            let inputs: Vec<&TaskId> = task.dependency_results.keys().collect();
            Ok(json!({ "task": task.id, "role": task.role, "inputs": inputs }))
        })
    }
}

/// Executor that reports itself unavailable for every task.
#[derive(Debug, Default)]
pub struct UnavailableExecutor;

impl Executor for UnavailableExecutor {
    fn execute(&self, _task: ScheduledTask) -> ExecFuture<'_> {
        Box::pin(async { Err(ExecutorError::Unavailable("backend offline".to_string())) })
    }
}
