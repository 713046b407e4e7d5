#![allow(dead_code)]

use std::sync::Arc;

use sleapbatch::config::ToolConfig;
use sleapbatch::engine::Engine;

pub use sleapbatch_test_utils::builders::{ToolConfigBuilder, Workspace};
pub use sleapbatch_test_utils::fake_exporter::FakeExporter;
pub use sleapbatch_test_utils::fake_supervisor::FakeSupervisor;
pub use sleapbatch_test_utils::{init_tracing, log_texts, progress_values, with_timeout};

/// An engine wired to the given fakes.
pub fn engine_with(cfg: ToolConfig, supervisor: &FakeSupervisor, exporter: &FakeExporter) -> Engine {
    Engine::new(cfg, Arc::new(supervisor.clone()), Arc::new(exporter.clone()))
}

/// True when `haystack` has a line containing `needle`.
pub fn has_line(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|l| l.contains(needle))
}
