use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use sleapbatch::engine::{CancelFlag, TaskReporter};
use sleapbatch::exec::ProgressState;
use sleapbatch::labels::{ExportFuture, LabelsExporter};

/// A fake exporter that records `(labels, csv)` pairs and writes a tiny CSV,
/// fails for labels paths containing a chosen substring, or hangs on one
/// until the cancel flag is set.
#[derive(Clone, Default)]
pub struct FakeExporter {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    fail_when: Option<String>,
    block_when: Option<String>,
}

impl FakeExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_when(mut self, needle: &str) -> Self {
        self.fail_when = Some(needle.to_string());
        self
    }

    /// Labels paths containing `needle` never finish on their own.
    pub fn blocking_when(mut self, needle: &str) -> Self {
        self.block_when = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// File names of every CSV the exporter was asked to write.
    pub fn csv_names(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|(_, csv)| csv.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

fn mentions(path: &Path, needle: Option<&str>) -> bool {
    needle.is_some_and(|n| path.to_string_lossy().contains(n))
}

impl LabelsExporter for FakeExporter {
    fn export<'a>(
        &'a self,
        labels: &'a Path,
        csv: &'a Path,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
        progress: ProgressState,
    ) -> ExportFuture<'a> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((labels.to_path_buf(), csv.to_path_buf()));
            reporter.progress(progress.percent_at(0.0));

            if mentions(labels, self.block_when.as_deref()) {
                while !cancel.is_cancelled() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                bail!("conversion of {} cancelled", labels.display());
            }

            if mentions(labels, self.fail_when.as_deref()) {
                bail!("could not read {}", labels.display());
            }

            tokio::fs::write(csv, b"frame_idx,node,x,y\n").await?;
            Ok(())
        })
    }
}
