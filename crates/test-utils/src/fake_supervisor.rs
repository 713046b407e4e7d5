use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sleapbatch::engine::{CancelFlag, TaskReporter};
use sleapbatch::errors::SuperviseError;
use sleapbatch::exec::{Invocation, ProcessSupervisor, SuperviseFuture};

/// A fake supervisor that:
/// - records every invocation it is asked to run
/// - reports start/end progress for each one, like the real monitor
/// - optionally writes the file named by `-o`, so later stages find it
/// - fails or waits for cancellation on a chosen call.
#[derive(Clone, Default)]
pub struct FakeSupervisor {
    calls: Arc<Mutex<Vec<Invocation>>>,
    fail_at: Option<usize>,
    fail_when: Option<String>,
    block_at: Option<usize>,
    delay: Duration,
    create_outputs: bool,
}

impl FakeSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call number `index` (0-based) exits with code 1.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Any call whose command line contains `needle` exits with code 1.
    pub fn failing_when(mut self, needle: &str) -> Self {
        self.fail_when = Some(needle.to_string());
        self
    }

    /// Call number `index` runs until the cancel flag is set.
    pub fn blocking_at(mut self, index: usize) -> Self {
        self.block_at = Some(index);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn creating_outputs(mut self) -> Self {
        self.create_outputs = true;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.program).collect()
    }

    fn record(&self, invocation: &Invocation) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(invocation.clone());
        calls.len() - 1
    }
}

fn output_arg(invocation: &Invocation) -> Option<PathBuf> {
    let pos = invocation.args.iter().position(|a| a == "-o")?;
    invocation.args.get(pos + 1).map(PathBuf::from)
}

impl ProcessSupervisor for FakeSupervisor {
    fn supervise<'a>(
        &'a self,
        invocation: &'a Invocation,
        cancel: &'a CancelFlag,
        reporter: &'a TaskReporter,
    ) -> SuperviseFuture<'a> {
        Box::pin(async move {
            let index = self.record(invocation);
            reporter.progress(invocation.progress.percent_at(0.0));
            reporter.log(format!("[OUTPUT] fake run of {}", invocation.description));

            if self.block_at == Some(index) {
                while !cancel.is_cancelled() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                reporter.log(format!("{}... cancelled", invocation.description));
                return Err(SuperviseError::Cancelled);
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let fails = self.fail_at == Some(index)
                || self
                    .fail_when
                    .as_deref()
                    .is_some_and(|needle| invocation.command_line().contains(needle));
            if fails {
                reporter.log("[ERROR] fake failure");
                return Err(SuperviseError::Failed {
                    code: Some(1),
                    stderr: "fake failure".to_string(),
                });
            }

            if self.create_outputs {
                if let Some(path) = output_arg(invocation) {
                    if let Some(parent) = path.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&path, b"fake output").await?;
                }
            }

            reporter.progress(invocation.progress.percent_at(100.0));
            Ok(())
        })
    }
}
