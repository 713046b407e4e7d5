// src/errors.rs

//! Crate-wide error types.
//!
//! The taxonomy follows how far a failure gets:
//! - [`ValidationError`]: bad input, caught before any process starts.
//! - [`SuperviseError`]: one supervised external process did not succeed.
//! - [`SleapBatchError`]: everything surfaced at the submission / CLI level.
//!
//! Per-item export failures never become an error value; they are logged and
//! counted by the export runner.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Input rejected before a task starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a model.")]
    MissingModel,

    #[error("Model file does not exist: {0}")]
    ModelNotFound(PathBuf),

    #[error("Please add at least one video file.")]
    NoVideos,

    #[error("Problem with video: {0}\nFile does not exist")]
    VideoNotFound(PathBuf),

    #[error("Please specify an output directory.")]
    NoOutputDirectories,

    #[error(
        "{videos} video(s) but {outputs} output director(ies); each video needs exactly one output directory"
    )]
    ListMismatch { videos: usize, outputs: usize },

    #[error("No .{extension} files found in {dirs}")]
    NoLabelsFound { extension: String, dirs: String },

    #[error("Could not read directory {path}: {message}")]
    UnreadableDirectory { path: PathBuf, message: String },

    #[error("Frame rate must be between 1 and 240 (got {0})")]
    FrameRateOutOfRange(u32),
}

/// Why a single supervised process invocation did not succeed.
#[derive(Error, Debug)]
pub enum SuperviseError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exited with code {}: {stderr}", exit_code_label(.code))]
    Failed { code: Option<i32>, stderr: String },

    #[error("{description} timed out after {}", limit_label(.limit))]
    TimedOut {
        description: String,
        limit: Duration,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error while supervising process: {0}")]
    Io(#[from] std::io::Error),
}

impl SuperviseError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SuperviseError::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum SleapBatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("A task is already running; wait for it to finish or cancel it")]
    Busy,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (killed by signal)".to_string(),
    }
}

fn limit_label(limit: &Duration) -> String {
    crate::exec::format_elapsed(*limit)
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SleapBatchError>;
