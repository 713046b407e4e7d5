// src/engine/submit.rs

//! Task submission.
//!
//! The [`Engine`] validates a request, refuses it while another task is
//! running, then runs it on a background tokio task and hands the caller a
//! [`TaskHandle`]. Every accepted submission produces exactly one terminal
//! result.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info};

use crate::config::{SettingsStore, ToolConfig};
use crate::engine::channel::{CancelFlag, Completion, TaskHandle, TaskReporter, TaskResult, task_channel};
use crate::engine::validate::{PreparedTask, prepare};
use crate::engine::{Task, TaskOutcome, TaskRunner};
use crate::errors::{Result, SleapBatchError};
use crate::exec::{ProcessMonitor, ProcessSupervisor, ProgressState};
use crate::labels::{ConvertExporter, LabelsExporter};
use crate::workflow::{PreparedWorkflow, WorkflowCoordinator, WorkflowRequest, prepare_workflow};

/// Accepts tasks and workflows; at most one runs at a time.
pub struct Engine {
    runner: TaskRunner,
    busy: Arc<AtomicBool>,
    settings: Option<SettingsStore>,
}

impl Engine {
    pub fn new(
        config: ToolConfig,
        supervisor: Arc<dyn ProcessSupervisor>,
        exporter: Arc<dyn LabelsExporter>,
    ) -> Self {
        Self {
            runner: TaskRunner::new(supervisor, exporter, Arc::new(config)),
            busy: Arc::new(AtomicBool::new(false)),
            settings: None,
        }
    }

    /// Engine backed by real processes: [`ProcessMonitor`] and
    /// [`ConvertExporter`].
    pub fn with_processes(config: ToolConfig) -> Self {
        let supervisor: Arc<dyn ProcessSupervisor> = Arc::new(ProcessMonitor::from_config(&config));
        let exporter = Arc::new(ConvertExporter::new(
            Arc::clone(&supervisor),
            Arc::new(config.clone()),
        ));
        Self::new(config, supervisor, exporter)
    }

    /// Remember the model path in `store` after each accepted submission.
    pub fn with_settings(mut self, store: SettingsStore) -> Self {
        self.settings = Some(store);
        self
    }

    pub fn config(&self) -> &ToolConfig {
        self.runner.config()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Validate and start `task`.
    ///
    /// Errors are returned synchronously and nothing is started:
    /// [`SleapBatchError::Busy`] while another task runs, or
    /// [`SleapBatchError::Validation`] for bad input.
    pub fn submit(&self, task: Task) -> Result<TaskHandle> {
        let guard = BusyGuard::acquire(&self.busy).ok_or(SleapBatchError::Busy)?;
        let prepared = prepare(&task, self.config())?;

        if let (Task::Track(params), Some(store)) = (&task, &self.settings) {
            store.remember_model(&params.model);
        }

        info!(kind = %task.kind(), items = prepared.item_count(), "task accepted");
        let banner = banner_for(&prepared);
        let runner = self.runner.clone();

        Ok(spawn_task(guard, banner, move |cancel, reporter| async move {
            runner
                .run(&prepared, &cancel, &reporter, ProgressState::FULL)
                .await
        }))
    }

    /// Validate and start the full track/export/render workflow.
    pub fn submit_workflow(&self, request: WorkflowRequest) -> Result<TaskHandle> {
        let guard = BusyGuard::acquire(&self.busy).ok_or(SleapBatchError::Busy)?;
        let workflow = prepare_workflow(&request, self.config())?;

        if let Some(store) = &self.settings {
            store.remember_model(&workflow.model);
        }

        info!(items = workflow.items.len(), order = ?workflow.order, "workflow accepted");
        let banner = workflow_banner(&workflow);
        let runner = self.runner.clone();

        Ok(spawn_task(guard, banner, move |cancel, reporter| async move {
            let mut coordinator = WorkflowCoordinator::new(runner);
            coordinator.run(&workflow, &cancel, &reporter).await
        }))
    }
}

/// Holds the engine's busy flag until dropped.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn spawn_task<F, Fut>(guard: BusyGuard, banner: Vec<String>, body: F) -> TaskHandle
where
    F: FnOnce(CancelFlag, TaskReporter) -> Fut + Send + 'static,
    Fut: Future<Output = TaskOutcome> + Send + 'static,
{
    let cancel = CancelFlag::new();
    let (reporter, completion, events) = task_channel();

    let task_cancel = cancel.clone();
    let join = tokio::spawn(async move {
        reporter.progress(0);
        for line in banner {
            reporter.log(line);
        }

        let outcome = body(task_cancel, reporter.clone()).await;

        // Released before the result goes out so a caller reacting to it can
        // submit again straight away.
        drop(guard);
        conclude(outcome, &reporter, completion);
    });

    TaskHandle::new(cancel, events, join)
}

fn conclude(outcome: TaskOutcome, reporter: &TaskReporter, completion: Completion) {
    let result = match outcome {
        TaskOutcome::Succeeded(message) => {
            info!(%message, "task succeeded");
            reporter.progress(100);
            reporter.log(format!("Success: {message}"));
            TaskResult {
                success: true,
                message,
            }
        }
        TaskOutcome::Failed(message) => {
            error!(%message, "task failed");
            reporter.log(format!("Error: {message}"));
            TaskResult {
                success: false,
                message,
            }
        }
        TaskOutcome::Cancelled(message) => {
            info!(%message, "task cancelled");
            reporter.log(format!("Cancelled: {message}"));
            TaskResult {
                success: false,
                message,
            }
        }
    };
    completion.finish(result);
}

fn banner_for(task: &PreparedTask) -> Vec<String> {
    match task {
        PreparedTask::Track {
            model,
            mode,
            base_name,
            pairs,
        } => {
            let mut lines = vec![
                format!("Starting analysis of {} video(s)", pairs.len()),
                format!("Model: {}", model.display()),
                format!("Mode: {mode}"),
                format!("Base name: {base_name}"),
            ];
            for (i, (video, output_dir)) in pairs.iter().enumerate() {
                lines.push(format!(
                    "  {}. {} -> {}",
                    i + 1,
                    video.display(),
                    output_dir.display()
                ));
            }
            lines
        }
        PreparedTask::Render {
            labels,
            frame_rate,
            format,
        } => vec![
            format!("Starting video creation for {} file(s)", labels.len()),
            format!("Frame rate: {frame_rate} fps, format: {format}"),
        ],
        PreparedTask::Export { labels, .. } => {
            vec![format!("Starting CSV export for {} file(s)", labels.len())]
        }
    }
}

fn workflow_banner(workflow: &PreparedWorkflow) -> Vec<String> {
    let mut lines = vec![
        format!("Model: {}", workflow.model.display()),
        format!("Mode: {}", workflow.mode),
        format!("Base name: {}", workflow.base_name),
        format!(
            "Frame rate: {} fps, format: {}",
            workflow.frame_rate, workflow.format
        ),
    ];
    for (i, item) in workflow.items.iter().enumerate() {
        lines.push(format!(
            "  {}. {} -> {}",
            i + 1,
            item.video.display(),
            item.output_dir.display()
        ));
    }
    lines
}
