// src/exec/command.rs

//! Process-backed executor: each task runs the role's shell command.

use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RoleConfig;
use crate::dag::{ScheduledTask, TaskResult};
use crate::errors::{Result, RolegraphError};
use crate::exec::{ExecFuture, ExecResult, Executor, ExecutorError};
use crate::store::RoleMemory;
use crate::types::RoleName;

/// Runs `cmd` through the platform shell for every task of a role.
///
/// The task description is written to the child's stdin and also exposed as
/// environment variables:
/// - `ROLEGRAPH_TASK_ID`
/// - `ROLEGRAPH_ROLE`
/// - `ROLEGRAPH_DESCRIPTION`
/// - `ROLEGRAPH_DEPENDENCY_RESULTS` (JSON object keyed by dependency id)
///
/// Exit status 0 is success; stdout becomes the result (parsed as JSON when
/// it is valid JSON, otherwise wrapped as `{"stdout": ...}`).
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    role: RoleName,
    cmd: String,
    fail_on_stdout: Option<Regex>,
    timeout: Option<Duration>,
    memory: Option<RoleMemory>,
}

impl CommandExecutor {
    pub fn new(role: impl Into<RoleName>, cmd: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            cmd: cmd.into(),
            fail_on_stdout: None,
            timeout: None,
            memory: None,
        }
    }

    /// Build from a validated `[role.<name>]` section.
    pub fn from_config(role: &str, cfg: &RoleConfig) -> Result<Self> {
        let mut exec = Self::new(role, cfg.cmd.clone());

        if let Some(ref pattern) = cfg.fail_on_stdout {
            let re = Regex::new(pattern).map_err(|e| {
                RolegraphError::ConfigError(format!(
                    "role '{role}' has invalid fail_on_stdout regex '{pattern}': {e}"
                ))
            })?;
            exec = exec.with_fail_pattern(re);
        }

        if let Some(timeout) = cfg.timeout()? {
            exec = exec.with_timeout(timeout);
        }

        Ok(exec)
    }

    /// Any stdout line matching `re` turns an otherwise successful run into a
    /// business failure.
    pub fn with_fail_pattern(mut self, re: Regex) -> Self {
        self.fail_on_stdout = Some(re);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Record each successful result in the role's persistent state.
    pub fn with_memory(mut self, memory: RoleMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    async fn run(&self, task: ScheduledTask) -> ExecResult {
        info!(
            task = %task.id,
            role = %self.role,
            cmd = %self.cmd,
            "starting task process"
        );

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        let dependency_results = serde_json::to_string(&task.dependency_results)
            .map_err(|e| ExecutorError::Unavailable(format!("encoding dependency results: {e}")))?;

        cmd.env("ROLEGRAPH_TASK_ID", &task.id)
            .env("ROLEGRAPH_ROLE", &task.role)
            .env("ROLEGRAPH_DESCRIPTION", &task.description)
            .env("ROLEGRAPH_DEPENDENCY_RESULTS", dependency_results)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ExecutorError::Unavailable(format!(
                "spawning process for role '{}': {e}",
                self.role
            ))
        })?;

        // Stdin is fed while stdout/stderr drain; a child that writes a lot
        // before reading would otherwise block on a full pipe.
        let stdin = child.stdin.take();
        let feed = async {
            if let Some(mut stdin) = stdin {
                // The command may exit without reading stdin; a broken pipe
                // here is not a task failure.
                if let Err(e) = stdin.write_all(task.description.as_bytes()).await {
                    debug!(task = %task.id, error = %e, "could not write description to stdin");
                }
            }
        };

        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| {
            ExecutorError::Unavailable(format!("waiting for process of task '{}': {e}", task.id))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stderr.lines() {
            debug!(task = %task.id, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            task = %task.id,
            exit_code = code,
            success = output.status.success(),
            "task process exited"
        );

        if !output.status.success() {
            let detail = stderr.lines().last().unwrap_or("").trim();
            return Err(ExecutorError::Failed(if detail.is_empty() {
                format!("command exited with code {code}")
            } else {
                format!("command exited with code {code}: {detail}")
            }));
        }

        if let Some(ref re) = self.fail_on_stdout {
            if let Some(line) = stdout.lines().find(|l| re.is_match(l)) {
                return Err(ExecutorError::Failed(format!(
                    "stdout matched fail_on_stdout: {}",
                    line.trim()
                )));
            }
        }

        let result = parse_stdout(&stdout);
        self.remember(&task, &result);
        Ok(result)
    }

    fn remember(&self, task: &ScheduledTask, result: &TaskResult) {
        let Some(ref memory) = self.memory else {
            return;
        };

        let update = json!({
            "last_task": task.id,
            "last_result": result,
        });

        if let Err(e) = memory.update_state(update) {
            warn!(task = %task.id, role = %self.role, error = %e, "failed to record role state");
        }
    }
}

impl Executor for CommandExecutor {
    fn execute(&self, task: ScheduledTask) -> ExecFuture<'_> {
        Box::pin(async move {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, self.run(task)).await {
                    Ok(result) => result,
                    Err(_) => Err(ExecutorError::TimedOut(limit)),
                },
                None => self.run(task).await,
            }
        })
    }
}

/// Stdout as JSON when it parses, otherwise `{"stdout": <text>}`.
fn parse_stdout(stdout: &str) -> TaskResult {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return json!({ "stdout": "" });
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| json!({ "stdout": stdout }))
}
