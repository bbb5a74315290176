#![allow(dead_code)]

use std::collections::BTreeMap;

use rolegraph::config::{ConfigSection, RawWorkflowFile, RoleConfig, TaskConfig, WorkflowFile};
use rolegraph::errors::Result;
use rolegraph::types::FailurePolicy;

/// Builder for `WorkflowFile` to simplify test setup.
pub struct WorkflowBuilder {
    raw: RawWorkflowFile,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawWorkflowFile {
                config: ConfigSection::default(),
                role: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn role(mut self, name: &str, cmd: &str) -> Self {
        self.raw
            .role
            .insert(name.to_string(), RoleConfigBuilder::new(cmd).build());
        self
    }

    pub fn with_role(mut self, name: &str, role: RoleConfig) -> Self {
        self.raw.role.insert(name.to_string(), role);
        self
    }

    /// Shorthand for a task with no description.
    pub fn task(self, id: &str, role: &str, after: &[&str]) -> Self {
        let mut task = TaskConfigBuilder::new(role);
        for dep in after {
            task = task.after(dep);
        }
        self.with_task(id, task.build())
    }

    pub fn with_task(mut self, id: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(id.to_string(), task);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.raw.config.max_concurrency = Some(n);
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.raw.config.failure_policy = policy;
        self
    }

    pub fn poll_interval(mut self, interval: &str) -> Self {
        self.raw.config.poll_interval = interval.to_string();
        self
    }

    pub fn workspace(mut self, dir: &str) -> Self {
        self.raw.config.workspace = Some(dir.to_string());
        self
    }

    pub fn raw(self) -> RawWorkflowFile {
        self.raw
    }

    pub fn try_build(self) -> Result<WorkflowFile> {
        WorkflowFile::try_from(self.raw)
    }

    pub fn build(self) -> WorkflowFile {
        self.try_build()
            .expect("Failed to build valid workflow from builder")
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RoleConfig`.
pub struct RoleConfigBuilder {
    role: RoleConfig,
}

impl RoleConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            role: RoleConfig {
                cmd: cmd.to_string(),
                fail_on_stdout: None,
                timeout: None,
                context: Default::default(),
            },
        }
    }

    pub fn fail_on_stdout(mut self, pattern: &str) -> Self {
        self.role.fail_on_stdout = Some(pattern.to_string());
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.role.timeout = Some(timeout.to_string());
        self
    }

    pub fn build(self) -> RoleConfig {
        self.role
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(role: &str) -> Self {
        Self {
            task: TaskConfig {
                role: role.to_string(),
                description: String::new(),
                after: Vec::new(),
            },
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.task.description = description.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
