// src/workflow/coordinator.rs

//! Async driver for the full workflow.
//!
//! Interleaved mode walks a [`WorkflowState`] one (item, stage) at a time;
//! staged mode runs every track, then every export, then every render. Any
//! stage failure or cancellation halts the whole workflow.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::engine::{PreparedTask, TaskOutcome, TaskRunner};
use crate::labels::{file_name, track_output_path};
use crate::types::WorkflowMode;
use crate::workflow::PreparedWorkflow;
use crate::workflow::state::{Stage, WorkflowItem, WorkflowState, staged_scope};

pub struct WorkflowCoordinator {
    runner: TaskRunner,
    state: Option<WorkflowState>,
}

impl WorkflowCoordinator {
    pub fn new(runner: TaskRunner) -> Self {
        Self {
            runner,
            state: None,
        }
    }

    /// Cursor of the workflow in progress, if any.
    pub fn state(&self) -> Option<&WorkflowState> {
        self.state.as_ref()
    }

    pub async fn run(
        &mut self,
        workflow: &PreparedWorkflow,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
    ) -> TaskOutcome {
        let total = workflow.items.len();
        info!(total, order = ?workflow.order, "starting workflow");
        reporter.log(format!(
            "Starting complete workflow for {total} video(s): tracking, CSV export, video rendering"
        ));

        match workflow.order {
            WorkflowMode::Interleaved => self.run_interleaved(workflow, cancel, reporter).await,
            WorkflowMode::Staged => self.run_staged(workflow, cancel, reporter).await,
        }
    }

    async fn run_interleaved(
        &mut self,
        workflow: &PreparedWorkflow,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
    ) -> TaskOutcome {
        self.state = Some(WorkflowState::new(workflow.items.clone()));

        loop {
            let Some(state) = self.state.as_ref() else {
                break;
            };
            let Some(item) = state.current_item().cloned() else {
                break;
            };
            let index = state.item_index();
            let total = state.total_items();
            let stage = state.stage();
            let scope = state.scope();

            if cancel.is_cancelled() {
                self.state = None;
                return TaskOutcome::Cancelled(format!(
                    "Workflow cancelled before {stage} of video {}/{total}",
                    index + 1
                ));
            }

            reporter.log(format!(
                "[Workflow] Video {}/{total} ({}): {stage}",
                index + 1,
                file_name(&item.video)
            ));

            let task = stage_task(
                workflow,
                stage,
                std::slice::from_ref(&item),
                &self.runner.config().batch.labels_extension,
            );
            let outcome = self.runner.run(&task, cancel, reporter, scope).await;

            match outcome {
                TaskOutcome::Succeeded(message) => {
                    debug!(index, %stage, %message, "workflow stage finished");
                    if let Some(state) = self.state.as_mut() {
                        state.advance();
                    }
                }
                TaskOutcome::Failed(message) => {
                    warn!(index, %stage, %message, "workflow halted");
                    self.state = None;
                    return TaskOutcome::Failed(format!(
                        "Workflow halted during {stage} of video {}/{total}: {message}",
                        index + 1
                    ));
                }
                TaskOutcome::Cancelled(message) => {
                    self.state = None;
                    return TaskOutcome::Cancelled(format!(
                        "Workflow cancelled during {stage} of video {}/{total}: {message}",
                        index + 1
                    ));
                }
            }
        }

        self.state = None;
        TaskOutcome::Succeeded(format!(
            "Complete workflow finished for {} video(s).",
            workflow.items.len()
        ))
    }

    async fn run_staged(
        &mut self,
        workflow: &PreparedWorkflow,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
    ) -> TaskOutcome {
        let labels_extension = self.runner.config().batch.labels_extension.clone();

        for stage in Stage::ALL {
            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled(format!("Workflow cancelled before {stage}"));
            }

            reporter.log(format!(
                "[Workflow] Stage {}/{}: {stage} of {} video(s)",
                stage.ordinal() + 1,
                Stage::COUNT,
                workflow.items.len()
            ));

            let task = stage_task(workflow, stage, &workflow.items, &labels_extension);
            let outcome = self
                .runner
                .run(&task, cancel, reporter, staged_scope(stage))
                .await;

            match outcome {
                TaskOutcome::Succeeded(message) => {
                    debug!(%stage, %message, "workflow stage finished");
                }
                TaskOutcome::Failed(message) => {
                    warn!(%stage, %message, "workflow halted");
                    return TaskOutcome::Failed(format!(
                        "Workflow halted during {stage}: {message}"
                    ));
                }
                TaskOutcome::Cancelled(message) => {
                    return TaskOutcome::Cancelled(format!(
                        "Workflow cancelled during {stage}: {message}"
                    ));
                }
            }
        }

        TaskOutcome::Succeeded(format!(
            "Complete workflow finished for {} video(s).",
            workflow.items.len()
        ))
    }
}

fn labels_for(workflow: &PreparedWorkflow, items: &[WorkflowItem], labels_extension: &str) -> Vec<PathBuf> {
    items
        .iter()
        .map(|item| {
            track_output_path(
                &item.output_dir,
                &workflow.base_name,
                &item.video,
                labels_extension,
            )
        })
        .collect()
}

/// The single-kind task that performs `stage` for `items`.
///
/// Export and render take the tracker's outputs directly, so nothing is
/// discovered from the output directories.
fn stage_task(
    workflow: &PreparedWorkflow,
    stage: Stage,
    items: &[WorkflowItem],
    labels_extension: &str,
) -> PreparedTask {
    match stage {
        Stage::Track => PreparedTask::Track {
            model: workflow.model.clone(),
            mode: workflow.mode,
            base_name: workflow.base_name.clone(),
            pairs: items
                .iter()
                .map(|item| (item.video.clone(), item.output_dir.clone()))
                .collect(),
        },
        Stage::Export => PreparedTask::Export {
            labels: labels_for(workflow, items, labels_extension),
            videos: items.iter().map(|item| item.video.clone()).collect(),
            base_name: workflow.base_name.clone(),
        },
        Stage::Render => PreparedTask::Render {
            labels: labels_for(workflow, items, labels_extension),
            frame_rate: workflow.frame_rate,
            format: workflow.format,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mode, VideoFormat};

    fn workflow() -> PreparedWorkflow {
        PreparedWorkflow {
            model: PathBuf::from("/m/model.json"),
            mode: Mode::Pupil,
            base_name: "labels.v001".into(),
            frame_rate: 60,
            format: VideoFormat::Avi,
            order: WorkflowMode::Interleaved,
            items: vec![WorkflowItem {
                video: PathBuf::from("/v/clip_01.mp4"),
                output_dir: PathBuf::from("/out"),
            }],
        }
    }

    #[test]
    fn render_stage_consumes_track_output() {
        let wf = workflow();
        match stage_task(&wf, Stage::Render, &wf.items, "slp") {
            PreparedTask::Render {
                labels,
                frame_rate,
                format,
            } => {
                assert_eq!(labels, vec![PathBuf::from("/out/labels.v001_clip_01.slp")]);
                assert_eq!(frame_rate, 60);
                assert_eq!(format, VideoFormat::Avi);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn export_stage_offers_source_videos_for_naming() {
        let wf = workflow();
        match stage_task(&wf, Stage::Export, &wf.items, "slp") {
            PreparedTask::Export { videos, .. } => {
                assert_eq!(videos, vec![PathBuf::from("/v/clip_01.mp4")]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
