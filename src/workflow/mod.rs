// src/workflow/mod.rs

//! Multi-stage workflow: track, export and render for every video.
//!
//! - [`state`]: the pure (item, stage) cursor and its progress mapping.
//! - [`coordinator`]: the async driver that runs each stage through the
//!   task runner.

use std::path::PathBuf;

use crate::config::ToolConfig;
use crate::engine::DEFAULT_BASE_NAME;
use crate::engine::validate::{check_frame_rate, check_model, check_videos, pair_outputs};
use crate::errors::ValidationError;
use crate::types::{Mode, VideoFormat, WorkflowMode};

pub mod coordinator;
pub mod state;

pub use coordinator::WorkflowCoordinator;
pub use state::{Stage, WorkflowItem, WorkflowState};

/// Everything the caller supplies for a full workflow.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub model: PathBuf,
    pub videos: Vec<PathBuf>,
    pub output_dirs: Vec<PathBuf>,
    pub base_name: String,
    pub mode: Mode,
    pub frame_rate: u32,
    pub format: VideoFormat,
    pub order: WorkflowMode,
}

/// A validated workflow request with videos paired to output directories.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWorkflow {
    pub model: PathBuf,
    pub mode: Mode,
    pub base_name: String,
    pub frame_rate: u32,
    pub format: VideoFormat,
    pub order: WorkflowMode,
    pub items: Vec<WorkflowItem>,
}

pub fn prepare_workflow(
    request: &WorkflowRequest,
    cfg: &ToolConfig,
) -> Result<PreparedWorkflow, ValidationError> {
    check_model(&request.model)?;
    if request.output_dirs.is_empty() {
        return Err(ValidationError::NoOutputDirectories);
    }
    check_videos(&request.videos)?;
    check_frame_rate(request.frame_rate)?;

    let items = pair_outputs(&request.videos, &request.output_dirs, cfg.batch.list_mismatch)?
        .into_iter()
        .map(|(video, output_dir)| WorkflowItem { video, output_dir })
        .collect();

    let base_name = match request.base_name.trim() {
        "" => DEFAULT_BASE_NAME.to_string(),
        name => name.to_string(),
    };

    Ok(PreparedWorkflow {
        model: request.model.clone(),
        mode: request.mode,
        base_name,
        frame_rate: request.frame_rate,
        format: request.format,
        order: request.order,
        items,
    })
}
