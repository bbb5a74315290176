// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{parse_duration, RawWorkflowFile, WorkflowFile};
use crate::errors::{Result, RolegraphError};

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = RolegraphError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_global_config(&raw)?;
        validate_roles(&raw)?;
        validate_task_dependencies(&raw)?;
        let order = dependency_order(&raw)?;
        Ok(WorkflowFile::new_unchecked(raw, order))
    }
}

fn ensure_has_tasks(cfg: &RawWorkflowFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RolegraphError::ConfigError(
            "workflow must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawWorkflowFile) -> Result<()> {
    if cfg.config.max_concurrency == Some(0) {
        return Err(RolegraphError::ConfigError(
            "[config].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    parse_duration(&cfg.config.poll_interval).map_err(|e| {
        RolegraphError::ConfigError(format!("[config].poll_interval: {e}"))
    })?;

    Ok(())
}

fn validate_roles(cfg: &RawWorkflowFile) -> Result<()> {
    for (name, role) in cfg.role.iter() {
        if role.cmd.trim().is_empty() {
            return Err(RolegraphError::ConfigError(format!(
                "role '{name}' has an empty cmd"
            )));
        }
        if let Some(ref pattern) = role.fail_on_stdout {
            Regex::new(pattern).map_err(|e| {
                RolegraphError::ConfigError(format!(
                    "role '{name}' has invalid fail_on_stdout regex: {e}"
                ))
            })?;
        }
        if let Some(ref timeout) = role.timeout {
            parse_duration(timeout).map_err(|e| {
                RolegraphError::ConfigError(format!("role '{name}' timeout: {e}"))
            })?;
        }
    }

    for (id, task) in cfg.task.iter() {
        if !cfg.role.contains_key(&task.role) {
            return Err(RolegraphError::ConfigError(format!(
                "task '{id}' uses unknown role '{}'",
                task.role
            )));
        }
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawWorkflowFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == id {
                return Err(RolegraphError::ConfigError(format!(
                    "task '{id}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(RolegraphError::ConfigError(format!(
                    "task '{id}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

/// Topologically sort the tasks; fails on a cycle.
///
/// Edge direction: dep -> task, so for `[task.B] after = ["A"]` we add A -> B.
fn dependency_order(cfg: &RawWorkflowFile) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in cfg.task.keys() {
        graph.add_node(id.as_str());
    }

    for (id, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(RolegraphError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
