// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{Result, RolegraphError};
use crate::types::FailurePolicy;

/// Workflow file exactly as deserialized from TOML.
///
/// ```toml
/// [config]
/// max_concurrency = 4
/// failure_policy = "block"
///
/// [role.architect]
/// cmd = "./agents/architect.sh"
///
/// [task.arch_001]
/// role = "architect"
/// description = "Create initial architecture"
///
/// [task.story_001]
/// role = "architect"
/// description = "Write user stories"
/// after = ["arch_001"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Executors from `[role.<name>]`.
    #[serde(default)]
    pub role: BTreeMap<String, RoleConfig>,

    /// Tasks from `[task.<id>]`; keys are task ids.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A workflow file that passed validation.
///
/// Only constructible through `TryFrom<RawWorkflowFile>` (or
/// [`crate::config::load_and_validate`]).
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub config: ConfigSection,
    pub role: BTreeMap<String, RoleConfig>,
    pub task: BTreeMap<String, TaskConfig>,
    /// Task ids in dependency order (dependencies first).
    order: Vec<String>,
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(raw: RawWorkflowFile, order: Vec<String>) -> Self {
        Self {
            config: raw.config,
            role: raw.role,
            task: raw.task,
            order,
        }
    }

    /// Task ids in an order where every task comes after its dependencies.
    pub fn submission_order(&self) -> &[String] {
        &self.order
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        parse_duration(&self.config.poll_interval).map_err(RolegraphError::ConfigError)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of tasks executing at once. Absent = unbounded.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// `"block"` (default) or `"cascade"`.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Fallback wake-up interval for the run loop, e.g. `"1s"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Directory for role state and version snapshots. When unset, executors
    /// run without a store.
    #[serde(default)]
    pub workspace: Option<String>,
}

fn default_poll_interval() -> String {
    "1s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            failure_policy: FailurePolicy::default(),
            poll_interval: default_poll_interval(),
            workspace: None,
        }
    }
}

/// `[role.<name>]` section: a process-backed executor.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// Shell command run for every task of this role.
    pub cmd: String,

    /// Regex; a matching stdout line marks the task as failed even when the
    /// command exits 0.
    #[serde(default)]
    pub fail_on_stdout: Option<String>,

    /// Duration string (e.g. `"30s"`) after which the task fails.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Static values stored next to the role's state in the workspace
    /// (`[role.<name>.context]`).
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl RoleConfig {
    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(RolegraphError::ConfigError)
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Role whose executor runs this task.
    pub role: String,

    /// Opaque payload handed to the executor.
    #[serde(default)]
    pub description: String,

    /// Ids of tasks that must complete first.
    #[serde(default)]
    pub after: Vec<String>,
}

/// Parse `"<n>ms"`, `"<n>s"`, `"<n>m"` or `"<n>h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{unit}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
