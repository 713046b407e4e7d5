// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::exec::ProgressFn;
use crate::types::{ListMismatchPolicy, Mode};

/// Tool configuration as read from `sleapbatch.toml`.
///
/// ```toml
/// [programs]
/// track = "sleap-track"
/// render = "sleap-render"
///
/// [timeouts]
/// track_secs = 14400
/// render_secs = 1800
///
/// [tracking]
/// face = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]
///
/// [batch]
/// list_mismatch = "reject"
/// ```
///
/// Every section is optional. Use [`ToolConfig`] (obtained through
/// `TryFrom<RawToolConfig>`) everywhere else; it has been validated.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawToolConfig {
    #[serde(default)]
    pub programs: ProgramsSection,

    #[serde(default)]
    pub timeouts: TimeoutsSection,

    #[serde(default)]
    pub progress: ProgressSection,

    #[serde(default)]
    pub tracking: TrackingSection,

    #[serde(default)]
    pub batch: BatchSection,
}

/// `[programs]`: external executables, looked up on `PATH` unless absolute.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramsSection {
    #[serde(default = "default_track_program")]
    pub track: String,

    #[serde(default = "default_render_program")]
    pub render: String,

    /// Used by the default labels exporter.
    #[serde(default = "default_convert_program")]
    pub convert: String,
}

fn default_track_program() -> String {
    "sleap-track".to_string()
}

fn default_render_program() -> String {
    "sleap-render".to_string()
}

fn default_convert_program() -> String {
    "sleap-convert".to_string()
}

impl Default for ProgramsSection {
    fn default() -> Self {
        Self {
            track: default_track_program(),
            render: default_render_program(),
            convert: default_convert_program(),
        }
    }
}

/// `[timeouts]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutsSection {
    /// Wall-clock ceiling per tracked video.
    #[serde(default = "default_track_secs")]
    pub track_secs: u64,

    /// Wall-clock ceiling per rendered video.
    #[serde(default = "default_render_secs")]
    pub render_secs: u64,

    /// Wall-clock ceiling per labels file converted to CSV.
    #[serde(default = "default_convert_secs")]
    pub convert_secs: u64,

    /// How often an elapsed-time status line is emitted.
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Liveness poll interval of the process monitor.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Grace period between the terminate signal and the forced kill.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
}

fn default_track_secs() -> u64 {
    4 * 60 * 60
}

fn default_render_secs() -> u64 {
    30 * 60
}

fn default_convert_secs() -> u64 {
    10 * 60
}

fn default_update_interval_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_kill_grace_ms() -> u64 {
    500
}

impl Default for TimeoutsSection {
    fn default() -> Self {
        Self {
            track_secs: default_track_secs(),
            render_secs: default_render_secs(),
            convert_secs: default_convert_secs(),
            update_interval_secs: default_update_interval_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            kill_grace_ms: default_kill_grace_ms(),
        }
    }
}

/// `[progress]`: elapsed-time progress estimate for opaque processes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressSection {
    #[serde(default = "default_seconds_per_percent")]
    pub seconds_per_percent: f64,

    #[serde(default = "default_cap")]
    pub cap: f64,
}

fn default_seconds_per_percent() -> f64 {
    60.0
}

fn default_cap() -> f64 {
    95.0
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            seconds_per_percent: default_seconds_per_percent(),
            cap: default_cap(),
        }
    }
}

/// `[tracking]`: node indices fed to the tracker's motion model, per mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackingSection {
    #[serde(default = "default_face_nodes")]
    pub face: Vec<u32>,

    #[serde(default = "default_pupil_nodes")]
    pub pupil: Vec<u32>,
}

fn default_face_nodes() -> Vec<u32> {
    (0..=11).collect()
}

fn default_pupil_nodes() -> Vec<u32> {
    (0..=7).collect()
}

impl Default for TrackingSection {
    fn default() -> Self {
        Self {
            face: default_face_nodes(),
            pupil: default_pupil_nodes(),
        }
    }
}

/// `[batch]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSection {
    #[serde(default)]
    pub list_mismatch: ListMismatchPolicy,

    /// Extension of the toolkit's labeled-data files, without the dot.
    #[serde(default = "default_labels_extension")]
    pub labels_extension: String,

    /// Extensions considered videos when pairing labels with their source.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

fn default_labels_extension() -> String {
    "slp".to_string()
}

fn default_video_extensions() -> Vec<String> {
    vec!["mp4".to_string(), "avi".to_string(), "mov".to_string()]
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            list_mismatch: ListMismatchPolicy::default(),
            labels_extension: default_labels_extension(),
            video_extensions: default_video_extensions(),
        }
    }
}

/// Validated tool configuration.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub programs: ProgramsSection,
    pub timeouts: TimeoutsSection,
    pub progress: ProgressSection,
    pub tracking: TrackingSection,
    pub batch: BatchSection,
}

impl ToolConfig {
    /// Construct without validation. Only `TryFrom<RawToolConfig>` should call
    /// this.
    pub(crate) fn new_unchecked(raw: RawToolConfig) -> Self {
        Self {
            programs: raw.programs,
            timeouts: raw.timeouts,
            progress: raw.progress,
            tracking: raw.tracking,
            batch: raw.batch,
        }
    }

    pub fn track_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.track_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.render_secs)
    }

    pub fn convert_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.convert_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.timeouts.update_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.timeouts.poll_interval_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.timeouts.kill_grace_ms)
    }

    pub fn progress_fn(&self) -> ProgressFn {
        ProgressFn::elapsed_linear(self.progress.seconds_per_percent, self.progress.cap)
    }

    pub fn node_indices(&self, mode: Mode) -> &[u32] {
        match mode {
            Mode::Face => &self.tracking.face,
            Mode::Pupil => &self.tracking.pupil,
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::new_unchecked(RawToolConfig::default())
    }
}
