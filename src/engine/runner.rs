// src/engine/runner.rs

//! Runs one prepared task, item by item, on the caller's progress scale.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::engine::{PreparedTask, TaskOutcome};
use crate::errors::SuperviseError;
use crate::exec::{ProcessSupervisor, ProgressState, render_invocation, track_invocation};
use crate::labels::{LabelsExporter, render_output_path, track_output_path};
use crate::types::{Mode, VideoFormat};

/// Executes track, render and export tasks.
///
/// Track and render abort on the first failing item; export is best-effort
/// (see `export.rs`). The cancel flag is checked before each item and the
/// supervisor watches it while a process runs.
#[derive(Clone)]
pub struct TaskRunner {
    supervisor: Arc<dyn ProcessSupervisor>,
    exporter: Arc<dyn LabelsExporter>,
    config: Arc<ToolConfig>,
}

impl TaskRunner {
    pub fn new(
        supervisor: Arc<dyn ProcessSupervisor>,
        exporter: Arc<dyn LabelsExporter>,
        config: Arc<ToolConfig>,
    ) -> Self {
        Self {
            supervisor,
            exporter,
            config,
        }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub(crate) fn exporter(&self) -> &dyn LabelsExporter {
        self.exporter.as_ref()
    }

    /// Run `task`, publishing progress inside `scope`.
    ///
    /// A standalone task uses [`ProgressState::FULL`]; a workflow stage
    /// passes its own slice.
    pub async fn run(
        &self,
        task: &PreparedTask,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
        scope: ProgressState,
    ) -> TaskOutcome {
        match task {
            PreparedTask::Track {
                model,
                mode,
                base_name,
                pairs,
            } => {
                self.run_track(model, *mode, base_name, pairs, cancel, reporter, scope)
                    .await
            }
            PreparedTask::Render {
                labels,
                frame_rate,
                format,
            } => {
                self.run_render(labels, *frame_rate, *format, cancel, reporter, scope)
                    .await
            }
            PreparedTask::Export {
                labels,
                videos,
                base_name,
            } => {
                self.run_export(labels, videos, base_name, cancel, reporter, scope)
                    .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_track(
        &self,
        model: &Path,
        mode: Mode,
        base_name: &str,
        pairs: &[(std::path::PathBuf, std::path::PathBuf)],
        cancel: &CancelFlag,
        reporter: &TaskReporter,
        scope: ProgressState,
    ) -> TaskOutcome {
        let total = pairs.len();
        info!(total, model = %model.display(), %mode, "tracking videos");

        for (index, (video, output_dir)) in pairs.iter().enumerate() {
            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled(format!(
                    "Tracking cancelled after {index} of {total} video(s)"
                ));
            }

            reporter.log(format!(
                "Processing video {}/{}: {}",
                index + 1,
                total,
                video.display()
            ));

            if let Err(err) = tokio::fs::create_dir_all(output_dir).await {
                return TaskOutcome::Failed(format!(
                    "Could not create output directory {}: {err}",
                    output_dir.display()
                ));
            }

            let output = track_output_path(
                output_dir,
                base_name,
                video,
                &self.config.batch.labels_extension,
            );
            let invocation = track_invocation(
                &self.config,
                model,
                video,
                &output,
                mode,
                scope.nested(index, total),
            );
            debug!(cmd = %invocation.command_line(), "launching tracker");

            match self.supervisor.supervise(&invocation, cancel, reporter).await {
                Ok(()) => {
                    reporter.log(format!("Completed processing: {}", output.display()));
                }
                Err(SuperviseError::Cancelled) => {
                    return TaskOutcome::Cancelled(format!(
                        "Tracking cancelled during video {} of {total}",
                        index + 1
                    ));
                }
                Err(err) => {
                    warn!(video = %video.display(), error = %err, "tracking failed");
                    return TaskOutcome::Failed(format!(
                        "Error processing video {} of {total} ({}): {err}",
                        index + 1,
                        video.display()
                    ));
                }
            }
        }

        TaskOutcome::Succeeded(format!(
            "Analysis completed successfully! Processed {total} video(s)."
        ))
    }

    async fn run_render(
        &self,
        labels: &[std::path::PathBuf],
        frame_rate: u32,
        format: VideoFormat,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
        scope: ProgressState,
    ) -> TaskOutcome {
        let total = labels.len();
        info!(total, frame_rate, %format, "rendering videos");

        for (index, labels_path) in labels.iter().enumerate() {
            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled(format!(
                    "Rendering cancelled after {index} of {total} file(s)"
                ));
            }

            reporter.log(format!(
                "Creating video {}/{}: {}",
                index + 1,
                total,
                labels_path.display()
            ));

            let output = render_output_path(labels_path, format);
            let invocation = render_invocation(
                &self.config,
                labels_path,
                &output,
                frame_rate,
                scope.nested(index, total),
            );
            debug!(cmd = %invocation.command_line(), "launching renderer");

            match self.supervisor.supervise(&invocation, cancel, reporter).await {
                Ok(()) => {
                    reporter.log(format!("Video created: {}", output.display()));
                }
                Err(SuperviseError::Cancelled) => {
                    return TaskOutcome::Cancelled(format!(
                        "Rendering cancelled during file {} of {total}",
                        index + 1
                    ));
                }
                Err(err) => {
                    warn!(labels = %labels_path.display(), error = %err, "rendering failed");
                    return TaskOutcome::Failed(format!(
                        "Error creating video {} of {total} ({}): {err}",
                        index + 1,
                        labels_path.display()
                    ));
                }
            }
        }

        TaskOutcome::Succeeded(format!("Created {total} video(s) successfully."))
    }
}
