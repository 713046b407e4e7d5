// src/labels/exporter.rs

//! The labeled-data to CSV conversion, treated as a black box.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::ToolConfig;
use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::exec::{ProcessSupervisor, ProgressState, convert_invocation};

pub type ExportFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Loads a labeled-data file and writes its tabular analysis CSV.
///
/// Implementations should stop promptly once `cancel` is set; the export
/// task reports the file as cancelled rather than failed in that case.
pub trait LabelsExporter: Send + Sync {
    fn export<'a>(
        &'a self,
        labels: &'a Path,
        csv: &'a Path,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
        progress: ProgressState,
    ) -> ExportFuture<'a>;
}

/// Default exporter: the toolkit's converter program,
/// `<program> <labels> --format analysis.csv -o <csv>`, run under the same
/// supervisor as the tracker and renderer.
#[derive(Clone)]
pub struct ConvertExporter {
    supervisor: Arc<dyn ProcessSupervisor>,
    config: Arc<ToolConfig>,
}

impl ConvertExporter {
    pub fn new(supervisor: Arc<dyn ProcessSupervisor>, config: Arc<ToolConfig>) -> Self {
        Self { supervisor, config }
    }
}

impl LabelsExporter for ConvertExporter {
    fn export<'a>(
        &'a self,
        labels: &'a Path,
        csv: &'a Path,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
        progress: ProgressState,
    ) -> ExportFuture<'a> {
        Box::pin(async move {
            let invocation = convert_invocation(&self.config, labels, csv, progress);
            debug!(cmd = %invocation.command_line(), "exporting labels");

            self.supervisor
                .supervise(&invocation, cancel, reporter)
                .await
                .with_context(|| format!("running '{}'", invocation.program))
        })
    }
}
