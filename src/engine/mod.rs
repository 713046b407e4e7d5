// src/engine/mod.rs

//! Task orchestration engine.
//!
//! - [`channel`]: the three-signal channel between a running task and its
//!   caller, the caller-owned `TaskHandle`, and the cancel flag.
//! - [`validate`]: turns a caller's `Task` into a `PreparedTask`, or rejects
//!   it before anything starts.
//! - [`runner`]: runs one prepared task (track, render or export) item by
//!   item; [`export`] holds the export kind.
//! - [`submit`]: the `Engine`, which accepts tasks and workflows and hands
//!   back a `TaskHandle`.

use std::fmt;
use std::path::PathBuf;

use crate::types::{Mode, VideoFormat};

pub mod channel;
pub mod export;
pub mod runner;
pub mod submit;
pub mod validate;

pub use channel::{CancelFlag, LogLine, TaskEvent, TaskHandle, TaskReporter, TaskResult};
pub use runner::TaskRunner;
pub use submit::Engine;
pub use validate::{PreparedTask, prepare};

/// Naming template used when the caller leaves it empty.
pub const DEFAULT_BASE_NAME: &str = "labels.v001";

/// Frame rate used when the caller does not pick one.
pub const DEFAULT_FRAME_RATE: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Track,
    Render,
    Export,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Track => f.write_str("track"),
            TaskKind::Render => f.write_str("render"),
            TaskKind::Export => f.write_str("export"),
        }
    }
}

/// Run the tracker on each video.
#[derive(Debug, Clone)]
pub struct TrackParams {
    pub model: PathBuf,
    pub videos: Vec<PathBuf>,
    /// One per video, or a single directory shared by all of them.
    pub output_dirs: Vec<PathBuf>,
    pub base_name: String,
    pub mode: Mode,
}

/// Render a visualization video for each labeled-data file.
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// Explicit inputs; when empty, `output_dirs` are scanned.
    pub labels: Vec<PathBuf>,
    pub output_dirs: Vec<PathBuf>,
    pub frame_rate: u32,
    pub format: VideoFormat,
}

/// Convert each labeled-data file to CSV.
#[derive(Debug, Clone)]
pub struct ExportParams {
    /// Explicit inputs; when empty, `output_dirs` are scanned.
    pub labels: Vec<PathBuf>,
    pub output_dirs: Vec<PathBuf>,
    /// Candidate source videos for naming the CSVs.
    pub videos: Vec<PathBuf>,
    pub base_name: String,
}

/// A unit of work submitted by the caller.
#[derive(Debug, Clone)]
pub enum Task {
    Track(TrackParams),
    Render(RenderParams),
    Export(ExportParams),
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::Track(_) => TaskKind::Track,
            Task::Render(_) => TaskKind::Render,
            Task::Export(_) => TaskKind::Export,
        }
    }
}

/// How a task (or one workflow stage) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded(String),
    Failed(String),
    Cancelled(String),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }

    pub fn message(&self) -> &str {
        match self {
            TaskOutcome::Succeeded(m) | TaskOutcome::Failed(m) | TaskOutcome::Cancelled(m) => m,
        }
    }
}
