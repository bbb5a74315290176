pub mod builders;
pub mod fake_executor;

use std::sync::{Arc, Once};

use rolegraph::engine::{Coordinator, RunOptions};
use rolegraph::exec::Executor;
use rolegraph::types::FailurePolicy;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=rolegraph=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Coordinator with `executor` bound to every role in `roles`.
pub async fn coordinator_with(
    roles: &[&str],
    executor: Arc<dyn Executor>,
    policy: FailurePolicy,
    max_concurrency: Option<usize>,
) -> Coordinator {
    let coordinator = Coordinator::new(
        policy,
        RunOptions {
            max_concurrency,
            ..RunOptions::default()
        },
    )
    .expect("invalid run options");
    for role in roles {
        coordinator
            .register(role, Arc::clone(&executor))
            .await
            .expect("role registration failed");
    }
    coordinator
}
