use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// Analysis mode; selects which tracked landmarks feed the tracker's motion
/// model (`--tracking.kf_node_indices`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Face,
    Pupil,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Face => f.write_str("face"),
            Mode::Pupil => f.write_str("pupil"),
        }
    }
}

/// Container format of rendered visualization videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Avi,
}

impl VideoFormat {
    pub fn extension(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to do when the number of videos and output directories differ.
///
/// - `Reject` (default): validation error before anything runs.
/// - `Pad`: legacy behaviour. A short output list is padded with its last
///   entry, a long one is truncated.
///
/// A single output directory is always shared by every video, under both
/// policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMismatchPolicy {
    #[default]
    Reject,
    Pad,
}

/// How a multi-item workflow walks its (item, stage) space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowMode {
    /// Track -> Export -> Render for item 1, then item 2, ...
    #[default]
    Interleaved,
    /// All tracks, then all exports, then all renders.
    Staged,
}
