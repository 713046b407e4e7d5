// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::{DEFAULT_BASE_NAME, DEFAULT_FRAME_RATE};
use crate::types::{Mode, VideoFormat};

/// Command-line arguments for `sleapbatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sleapbatch",
    version,
    about = "Batch pose tracking, video rendering and CSV export for SLEAP.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the tool config file (TOML).
    ///
    /// Default: `sleapbatch.toml` in the current working directory. A missing
    /// file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "sleapbatch.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SLEAPBATCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate inputs and print what would run, without running anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Track poses in each video.
    Track(TrackArgs),
    /// Render a visualization video for each labeled-data file.
    Render(RenderArgs),
    /// Convert each labeled-data file to an analysis CSV.
    Export(ExportArgs),
    /// Track, export and render every video.
    Workflow(WorkflowArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TrackArgs {
    /// Trained model file. Defaults to the last model used.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    #[arg(long = "video", value_name = "PATH", required = true)]
    pub videos: Vec<PathBuf>,

    /// One per video, or a single directory for all of them.
    #[arg(long = "output-dir", value_name = "DIR", required = true)]
    pub output_dirs: Vec<PathBuf>,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_BASE_NAME)]
    pub base_name: String,

    #[arg(long, value_enum, default_value_t = Mode::Face)]
    pub mode: Mode,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Labeled-data files. When omitted, the output directories are scanned.
    #[arg(long = "labels", value_name = "PATH")]
    pub labels: Vec<PathBuf>,

    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dirs: Vec<PathBuf>,

    #[arg(long, value_name = "FPS", default_value_t = DEFAULT_FRAME_RATE)]
    pub frame_rate: u32,

    #[arg(long, value_enum, default_value_t = VideoFormat::Mp4)]
    pub format: VideoFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Labeled-data files. When omitted, the output directories are scanned.
    #[arg(long = "labels", value_name = "PATH")]
    pub labels: Vec<PathBuf>,

    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dirs: Vec<PathBuf>,

    /// Source videos, used to name the CSV files.
    #[arg(long = "video", value_name = "PATH")]
    pub videos: Vec<PathBuf>,

    #[arg(long, value_name = "NAME", default_value = DEFAULT_BASE_NAME)]
    pub base_name: String,
}

#[derive(Debug, Clone, Args)]
pub struct WorkflowArgs {
    #[command(flatten)]
    pub track: TrackArgs,

    #[arg(long, value_name = "FPS", default_value_t = DEFAULT_FRAME_RATE)]
    pub frame_rate: u32,

    #[arg(long, value_enum, default_value_t = VideoFormat::Mp4)]
    pub format: VideoFormat,

    /// Run all tracks, then all exports, then all renders instead of
    /// finishing one video before starting the next.
    #[arg(long)]
    pub staged: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
