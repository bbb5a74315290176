// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, WorkflowFile};
use crate::engine::{Coordinator, RunOptions, WorkflowSnapshot};
use crate::exec::CommandExecutor;
use crate::store::{LocalStore, RoleMemory, VersionStore};
use crate::types::FailurePolicy;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - workflow loading (with CLI overrides)
/// - the optional workspace store
/// - one `CommandExecutor` per declared role
/// - task submission in dependency order
/// - the run loop, with Ctrl-C as graceful shutdown
///
/// The final snapshot is printed to stdout as JSON.
pub async fn run(args: CliArgs) -> Result<()> {
    let workflow_path = args.workflow.clone();
    let workflow = load_and_validate(&workflow_path)
        .with_context(|| format!("loading workflow {}", workflow_path.display()))?;

    if args.dry_run {
        print_dry_run(&workflow);
        return Ok(());
    }

    let policy = args
        .policy
        .map(FailurePolicy::from)
        .unwrap_or(workflow.config.failure_policy);
    let max_concurrency = match args.max_concurrency {
        Some(n) => Some(usize::try_from(n).context("--max-concurrency out of range")?),
        None => workflow.config.max_concurrency,
    };
    let options = RunOptions {
        max_concurrency,
        poll_interval: workflow.poll_interval()?,
    };

    let store = open_workspace(&workflow, &workflow_path)?;
    let coordinator = Coordinator::new(policy, options)?;

    for (role, role_cfg) in &workflow.role {
        let mut executor = CommandExecutor::from_config(role, role_cfg)?;
        if let Some(store) = &store {
            let memory = RoleMemory::new(role.as_str(), Arc::clone(store))
                .with_context(role_cfg.context.clone());
            executor = executor.with_memory(memory);
        }
        coordinator.register(role, Arc::new(executor)).await?;
    }

    for id in workflow.submission_order() {
        let Some(task) = workflow.task.get(id) else {
            continue;
        };
        coordinator
            .submit(&task.role, &task.description, id, task.after.clone())
            .await?;
    }

    info!(
        tasks = workflow.task.len(),
        roles = workflow.role.len(),
        ?policy,
        ?max_concurrency,
        "workflow loaded"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };
    let summary = coordinator.run_until(shutdown).await?;
    debug!(?summary, "run summary");

    print_snapshot(&coordinator.snapshot().await, args.compact)?;
    Ok(())
}

/// Open the workspace store, resolving a relative path against the
/// workflow file's directory.
fn open_workspace(
    workflow: &WorkflowFile,
    workflow_path: &Path,
) -> Result<Option<Arc<dyn VersionStore>>> {
    let Some(workspace) = &workflow.config.workspace else {
        return Ok(None);
    };

    let root = workflow_root_dir(workflow_path).join(workspace);
    let store = LocalStore::open(&root)
        .with_context(|| format!("opening workspace {}", root.display()))?;
    info!(workspace = %root.display(), "workspace store enabled");
    Ok(Some(Arc::new(store)))
}

/// Directory containing the workflow file, or the current directory for a
/// bare filename like "Rolegraph.toml".
fn workflow_root_dir(workflow_path: &Path) -> PathBuf {
    match workflow_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_snapshot(snapshot: &WorkflowSnapshot, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(snapshot)?
    } else {
        serde_json::to_string_pretty(snapshot)?
    };
    println!("{json}");
    Ok(())
}

fn print_dry_run(workflow: &WorkflowFile) {
    println!("rolegraph dry-run");
    println!("  config.failure_policy = {:?}", workflow.config.failure_policy);
    match workflow.config.max_concurrency {
        Some(n) => println!("  config.max_concurrency = {n}"),
        None => println!("  config.max_concurrency = unbounded"),
    }
    println!("  config.poll_interval = {}", workflow.config.poll_interval);
    if let Some(ref ws) = workflow.config.workspace {
        println!("  config.workspace = {ws}");
    }
    println!();

    println!("roles ({}):", workflow.role.len());
    for (name, role) in &workflow.role {
        println!("  - {name}");
        println!("      cmd: {}", role.cmd);
        if let Some(ref pattern) = role.fail_on_stdout {
            println!("      fail_on_stdout: {pattern}");
        }
        if let Some(ref timeout) = role.timeout {
            println!("      timeout: {timeout}");
        }
    }
    println!();

    println!("tasks ({}), in submission order:", workflow.task.len());
    for id in workflow.submission_order() {
        let Some(task) = workflow.task.get(id) else {
            continue;
        };
        println!("  - {id} [{}]", task.role);
        if !task.description.is_empty() {
            println!("      description: {}", task.description);
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }

    debug!("dry-run complete (no execution)");
}
