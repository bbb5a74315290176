// tests/failure_policy.rs

mod common;
use crate::common::{coordinator_with, init_tracing, with_timeout, FakeExecutor};

use std::sync::Arc;

use rolegraph::engine::Coordinator;
use rolegraph::types::{FailurePolicy, TaskStatus};

async fn chain(policy: FailurePolicy, executor: Arc<FakeExecutor>) -> Coordinator {
    let c = coordinator_with(&["r"], executor, policy, None).await;
    c.submit("r", "", "a", vec![]).await.unwrap();
    c.submit("r", "", "b", vec!["a".into()]).await.unwrap();
    c.submit("r", "", "c", vec!["b".into()]).await.unwrap();
    c.submit("r", "", "other", vec![]).await.unwrap();
    c.submit("r", "", "joined", vec!["other".into(), "b".into()])
        .await
        .unwrap();
    c
}

#[tokio::test]
async fn block_policy_keeps_dependents_blocked() {
    init_tracing();
    let executor = Arc::new(FakeExecutor::new().failing("a", "broken"));
    let c = chain(FailurePolicy::Block, Arc::clone(&executor)).await;

    let summary = with_timeout(c.run()).await.unwrap();
    assert_eq!(summary.failed, vec!["a"]);
    assert_eq!(summary.completed, vec!["other"]);
    assert_eq!(summary.blocked, vec!["b", "c", "joined"]);

    for id in ["b", "c", "joined"] {
        let task = c.task(id).await.unwrap();
        assert!(task.error.is_none());
        assert!(task.completed_at.is_none());
    }
}

#[tokio::test]
async fn cascade_policy_fails_transitive_dependents() {
    init_tracing();
    let executor = Arc::new(FakeExecutor::new().failing("a", "broken"));
    let c = chain(FailurePolicy::Cascade, Arc::clone(&executor)).await;

    let summary = with_timeout(c.run()).await.unwrap();
    assert_eq!(summary.completed, vec!["other"]);
    assert_eq!(summary.failed, vec!["a", "b", "c", "joined"]);
    assert!(summary.blocked.is_empty());

    let b = c.task("b").await.unwrap();
    assert_eq!(b.error.as_deref(), Some("dependency 'a' failed"));
    assert!(b.completed_at.is_some());
    assert!(b.started_at.is_none());

    let c_task = c.task("c").await.unwrap();
    assert_eq!(c_task.error.as_deref(), Some("dependency 'b' failed"));

    let log = executor.log();
    for id in ["b", "c", "joined"] {
        assert_eq!(log.count_for(id), 0, "cascaded task {id} must never run");
    }
}

#[tokio::test]
async fn cascade_policy_fails_late_submissions_on_failed_dependency() {
    let executor = Arc::new(FakeExecutor::new().failing("a", "broken"));
    let c = coordinator_with(&["r"], executor, FailurePolicy::Cascade, None).await;

    c.submit("r", "", "a", vec![]).await.unwrap();
    with_timeout(c.run()).await.unwrap();

    let late = c.submit("r", "", "late", vec!["a".into()]).await.unwrap();
    assert_eq!(late.status, TaskStatus::Failed);
    assert_eq!(late.error.as_deref(), Some("dependency 'a' failed"));
}

#[tokio::test]
async fn block_policy_late_submission_on_failed_dependency_is_blocked() {
    let executor = Arc::new(FakeExecutor::new().failing("a", "broken"));
    let c = coordinator_with(&["r"], executor, FailurePolicy::Block, None).await;

    c.submit("r", "", "a", vec![]).await.unwrap();
    with_timeout(c.run()).await.unwrap();

    let late = c.submit("r", "", "late", vec!["a".into()]).await.unwrap();
    assert_eq!(late.status, TaskStatus::Blocked);
}
