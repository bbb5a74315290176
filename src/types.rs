// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller-assigned task identifier.
pub type TaskId = String;

/// Name of an executor role (e.g. `"architect"`).
pub type RoleName = String;

/// Lifecycle status of a task.
///
/// `Pending`/`Blocked` are the two waiting states, `InProgress` marks a task
/// that has been handed to its executor, and `Completed`/`Failed` are
/// terminal. A task never re-enters `InProgress` once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Blocked,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Blocked => "blocked",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to dependents when a task fails.
///
/// - `Block`: dependents stay `Blocked` forever (default). Downstream
///   observers can tell "never ran because an input is missing" apart from
///   "ran and failed".
/// - `Cascade`: every transitive dependent that is still waiting is marked
///   `Failed` with an error naming the failed dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Block,
    Cascade,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" => Ok(FailurePolicy::Block),
            "cascade" => Ok(FailurePolicy::Cascade),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"block\" or \"cascade\")"
            )),
        }
    }
}
