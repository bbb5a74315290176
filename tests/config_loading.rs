// tests/config_loading.rs

mod common;
use crate::common::builders::{RoleConfigBuilder, TaskConfigBuilder, WorkflowBuilder};

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use rolegraph::config::{load_and_validate, load_from_path};
use rolegraph::errors::RolegraphError;
use rolegraph::types::FailurePolicy;

fn write_workflow(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_workflow_file_loads() {
    let file = write_workflow(
        r#"
[config]
max_concurrency = 2
failure_policy = "cascade"
poll_interval = "250ms"
workspace = ".rolegraph"

[role.architect]
cmd = "./agents/architect.sh"
timeout = "30s"

[role.architect.context]
project = "shop"
layers = 3

[role.developer]
cmd = "./agents/dev.sh"
fail_on_stdout = "^ERROR"

[task.story_001]
role = "architect"
description = "Write user stories"
after = ["arch_001"]

[task.arch_001]
role = "architect"
description = "Create initial architecture"

[task.impl_001]
role = "developer"
after = ["story_001", "arch_001"]
"#,
    );

    let wf = load_and_validate(file.path()).unwrap();
    assert_eq!(wf.config.max_concurrency, Some(2));
    assert_eq!(wf.config.failure_policy, FailurePolicy::Cascade);
    assert_eq!(wf.poll_interval().unwrap(), Duration::from_millis(250));
    assert_eq!(wf.config.workspace.as_deref(), Some(".rolegraph"));
    assert_eq!(
        wf.role["architect"].timeout().unwrap(),
        Some(Duration::from_secs(30))
    );
    assert_eq!(wf.role["architect"].context["project"], "shop");
    assert_eq!(wf.role["architect"].context["layers"], 3);
    assert!(wf.role["developer"].context.is_empty());
    assert_eq!(wf.task["impl_001"].description, "");
    assert_eq!(
        wf.submission_order(),
        &["arch_001", "story_001", "impl_001"]
    );
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = write_workflow(
        r#"
[role.r]
cmd = "true"

[task.only]
role = "r"
"#,
    );

    let wf = load_and_validate(file.path()).unwrap();
    assert_eq!(wf.config.max_concurrency, None);
    assert_eq!(wf.config.failure_policy, FailurePolicy::Block);
    assert_eq!(wf.poll_interval().unwrap(), Duration::from_secs(1));
    assert!(wf.config.workspace.is_none());
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_workflow(
        r#"
[role.r]
cmd = "true"

[task.A]
role = "r"
after = ["B"]

[task.B]
role = "r"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(RolegraphError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn unknown_policy_is_a_toml_error() {
    let file = write_workflow(
        r#"
[config]
failure_policy = "retry"

[role.r]
cmd = "true"

[task.t]
role = "r"
"#,
    );

    assert!(matches!(
        load_from_path(file.path()),
        Err(RolegraphError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RolegraphError::IoError(_)));
}

#[test]
fn builder_rejects_unknown_dependency() {
    let err = WorkflowBuilder::new()
        .role("r", "true")
        .task("a", "r", &["ghost"])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, RolegraphError::ConfigError(msg) if msg.contains("ghost")));
}

#[test]
fn builder_rejects_undeclared_role() {
    let err = WorkflowBuilder::new()
        .role("r", "true")
        .with_task("a", TaskConfigBuilder::new("reviewer").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, RolegraphError::ConfigError(msg) if msg.contains("reviewer")));
}

#[test]
fn builder_rejects_bad_role_settings() {
    let bad_regex = WorkflowBuilder::new()
        .with_role("r", RoleConfigBuilder::new("true").fail_on_stdout("[").build())
        .task("a", "r", &[])
        .try_build();
    assert!(matches!(bad_regex, Err(RolegraphError::ConfigError(_))));

    let bad_timeout = WorkflowBuilder::new()
        .with_role("r", RoleConfigBuilder::new("true").timeout("soon").build())
        .task("a", "r", &[])
        .try_build();
    assert!(matches!(bad_timeout, Err(RolegraphError::ConfigError(_))));
}

#[test]
fn builder_rejects_zero_concurrency_and_empty_workflow() {
    let zero = WorkflowBuilder::new()
        .role("r", "true")
        .task("a", "r", &[])
        .max_concurrency(0)
        .try_build();
    assert!(matches!(zero, Err(RolegraphError::ConfigError(_))));

    let empty = WorkflowBuilder::new().role("r", "true").try_build();
    assert!(matches!(empty, Err(RolegraphError::ConfigError(_))));
}

#[test]
fn submission_order_respects_dependencies() {
    let wf = WorkflowBuilder::new()
        .role("r", "true")
        .task("d", "r", &["b", "c"])
        .task("c", "r", &["a"])
        .task("b", "r", &["a"])
        .task("a", "r", &[])
        .build();

    let order = wf.submission_order();
    let pos = |id: &str| order.iter().position(|t| t == id).unwrap();
    assert_eq!(order.len(), 4);
    assert!(pos("a") < pos("b"));
    assert!(pos("a") < pos("c"));
    assert!(pos("b") < pos("d"));
    assert!(pos("c") < pos("d"));
}
