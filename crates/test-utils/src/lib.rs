//! Shared helpers for the `dagflow` integration tests.
//!
//! - [`builders`]: config and dag builders keyed by task name.
//! - [`fake_queue`]: a queue backend whose jobs complete on demand.

pub mod builders;
pub mod fake_queue;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Upper bound for a single scheduler run in tests.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and only shown for failing tests.
/// `RUST_LOG=dagflow=debug cargo test` shows the scheduler's decisions.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("dagflow=info"));

        // Another harness may already have installed one.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, failing the test if it takes longer than [`RUN_TIMEOUT`].
pub async fn with_timeout<F, T>(fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(RUN_TIMEOUT, fut).await {
        Ok(value) => value,
        Err(_) => panic!("run did not finish within {RUN_TIMEOUT:?}"),
    }
}
