#![allow(dead_code, unused_imports)]

pub use rolegraph_test_utils::builders;
pub use rolegraph_test_utils::fake_executor::{ExecutionLog, FakeExecutor, UnavailableExecutor};
pub use rolegraph_test_utils::{coordinator_with, init_tracing, with_timeout};
