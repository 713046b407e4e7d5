pub mod builders;
pub mod fake_exporter;
pub mod fake_supervisor;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

use sleapbatch::engine::TaskEvent;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
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
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Text of every log line in `events`, in order.
pub fn log_texts(events: &[TaskEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            TaskEvent::Log(line) => Some(line.text.clone()),
            _ => None,
        })
        .collect()
}

/// Every progress value in `events`, in order.
pub fn progress_values(events: &[TaskEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            TaskEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}
