// tests/concurrency.rs

mod common;
use crate::common::{coordinator_with, init_tracing, with_timeout, FakeExecutor};

use std::sync::Arc;
use std::time::Duration;

use rolegraph::engine::{Coordinator, RunOptions};
use rolegraph::errors::RolegraphError;
use rolegraph::types::{FailurePolicy, TaskStatus};

const SLEEP: Duration = Duration::from_millis(150);

#[tokio::test]
async fn independent_tasks_run_concurrently() {
    init_tracing();
    let executor = Arc::new(FakeExecutor::new().with_delay(SLEEP));
    let c = coordinator_with(&["r"], executor.clone(), FailurePolicy::Block, None).await;

    c.submit("r", "", "x", vec![]).await.unwrap();
    c.submit("r", "", "y", vec![]).await.unwrap();

    let started = std::time::Instant::now();
    with_timeout(c.run()).await.unwrap();

    assert!(executor.log().overlapped("x", "y"));
    assert_eq!(executor.peak_concurrency(), 2);
    assert!(started.elapsed() < SLEEP * 2);
}

#[tokio::test]
async fn limit_of_one_serializes_execution() {
    init_tracing();
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(30)));
    let c = coordinator_with(&["r"], executor.clone(), FailurePolicy::Block, Some(1)).await;

    for id in ["a", "b", "c"] {
        c.submit("r", "", id, vec![]).await.unwrap();
    }
    let summary = with_timeout(c.run()).await.unwrap();

    assert_eq!(summary.completed.len(), 3);
    assert_eq!(executor.peak_concurrency(), 1);
    let log = executor.log();
    assert!(!log.overlapped("a", "b"));
    assert!(!log.overlapped("b", "c"));
    // FIFO by enqueue time.
    assert_eq!(log.task_ids(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn zero_limit_is_rejected_instead_of_stalling() {
    let options = RunOptions {
        max_concurrency: Some(0),
        ..RunOptions::default()
    };
    let err = Coordinator::new(FailurePolicy::Block, options).unwrap_err();
    assert!(matches!(err, RolegraphError::ConfigError(msg) if msg.contains("max_concurrency")));
}

#[tokio::test]
async fn limit_caps_peak_concurrency() {
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(20)));
    let c = coordinator_with(&["r"], executor.clone(), FailurePolicy::Block, Some(3)).await;

    for i in 0..10 {
        c.submit("r", "", &format!("t{i}"), vec![]).await.unwrap();
    }
    let summary = with_timeout(c.run()).await.unwrap();

    assert_eq!(summary.completed.len(), 10);
    assert!(executor.peak_concurrency() <= 3);
    assert!(executor.peak_concurrency() >= 2);
}

#[tokio::test]
async fn wide_fan_out_executes_each_task_once() {
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(2)));
    let c = coordinator_with(&["r"], executor.clone(), FailurePolicy::Block, None).await;

    c.submit("r", "", "root", vec![]).await.unwrap();
    for i in 0..50 {
        c.submit("r", "", &format!("leaf{i}"), vec!["root".into()])
            .await
            .unwrap();
    }
    let deps: Vec<String> = (0..50).map(|i| format!("leaf{i}")).collect();
    c.submit("r", "", "sink", deps).await.unwrap();

    let summary = with_timeout(c.run()).await.unwrap();
    assert_eq!(summary.completed.len(), 52);

    let log = executor.log();
    assert_eq!(log.records().len(), 52);
    assert_eq!(log.count_for("sink"), 1);
    let sink = log.record_for("sink").unwrap();
    assert_eq!(sink.task.dependency_results.len(), 50);
}

#[tokio::test]
async fn tasks_submitted_during_a_run_are_picked_up() {
    init_tracing();
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(100)));
    let c = Arc::new(
        coordinator_with(&["r"], executor.clone(), FailurePolicy::Block, None).await,
    );

    c.submit("r", "", "first", vec![]).await.unwrap();
    let runner = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.run().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    c.submit("r", "", "second", vec!["first".into()]).await.unwrap();
    c.submit("r", "", "extra", vec![]).await.unwrap();

    let summary = with_timeout(runner).await.unwrap().unwrap();
    assert_eq!(summary.completed, vec!["extra", "first", "second"]);
    assert_eq!(c.task("second").await.unwrap().status, TaskStatus::Completed);
    assert!(executor.log().overlapped("first", "extra"));
}

#[tokio::test]
async fn second_concurrent_run_is_rejected() {
    let executor = Arc::new(FakeExecutor::new().with_delay(Duration::from_millis(100)));
    let c = Arc::new(coordinator_with(&["r"], executor, FailurePolicy::Block, None).await);
    c.submit("r", "", "slow", vec![]).await.unwrap();

    let runner = {
        let c = Arc::clone(&c);
        tokio::spawn(async move { c.run().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(c.run().await.is_err());
    with_timeout(runner).await.unwrap().unwrap();
}
