// src/exec/command.rs

//! Invocations of the external toolkit programs.
//!
//! The flag names below are a compatibility contract with the toolkit's
//! command-line interface and are passed through verbatim.

use std::path::Path;
use std::time::Duration;

use crate::config::ToolConfig;
use crate::exec::progress::{ProgressFn, ProgressState};
use crate::labels::file_name;
use crate::types::Mode;

/// Everything the process monitor needs to run and supervise one process.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Human-readable activity, e.g. `Tracking clip_01.mp4`.
    pub description: String,
    pub max_wait: Duration,
    pub update_interval: Duration,
    pub progress: ProgressState,
    pub progress_fn: ProgressFn,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, description: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args,
            description: description.into(),
            max_wait: Duration::from_secs(60 * 60),
            update_interval: Duration::from_secs(5),
            progress: ProgressState::FULL,
            progress_fn: ProgressFn::default(),
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_progress(mut self, progress: ProgressState) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_progress_fn(mut self, progress_fn: ProgressFn) -> Self {
        self.progress_fn = progress_fn;
        self
    }

    /// Shell-like rendering for log output.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"', '\'']) {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

/// Comma-separated node index list, e.g. `0,1,2`.
pub fn node_index_list(indices: &[u32]) -> String {
    indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Tracker invocation for one video.
pub fn track_invocation(
    cfg: &ToolConfig,
    model: &Path,
    video: &Path,
    output: &Path,
    mode: Mode,
    progress: ProgressState,
) -> Invocation {
    let args = vec![
        "-m".to_string(),
        model.to_string_lossy().into_owned(),
        "--tracking.tracker".to_string(),
        "flow".to_string(),
        "--tracking.similarity".to_string(),
        "centroid".to_string(),
        "--tracking.match".to_string(),
        "greedy".to_string(),
        "--tracking.kf_node_indices".to_string(),
        node_index_list(cfg.node_indices(mode)),
        "-o".to_string(),
        output.to_string_lossy().into_owned(),
        video.to_string_lossy().into_owned(),
    ];

    Invocation::new(
        cfg.programs.track.clone(),
        args,
        format!("Tracking {}", file_name(video)),
    )
    .with_max_wait(cfg.track_timeout())
    .with_update_interval(cfg.update_interval())
    .with_progress(progress)
    .with_progress_fn(cfg.progress_fn())
}

/// Renderer invocation for one labeled-data file.
pub fn render_invocation(
    cfg: &ToolConfig,
    labels: &Path,
    output_video: &Path,
    frame_rate: u32,
    progress: ProgressState,
) -> Invocation {
    let args = vec![
        "-o".to_string(),
        output_video.to_string_lossy().into_owned(),
        "-f".to_string(),
        frame_rate.to_string(),
        labels.to_string_lossy().into_owned(),
    ];

    Invocation::new(
        cfg.programs.render.clone(),
        args,
        format!("Rendering {}", file_name(output_video)),
    )
    .with_max_wait(cfg.render_timeout())
    .with_update_interval(cfg.update_interval())
    .with_progress(progress)
    .with_progress_fn(cfg.progress_fn())
}

/// Converter invocation writing the analysis CSV of one labeled-data file.
pub fn convert_invocation(
    cfg: &ToolConfig,
    labels: &Path,
    csv: &Path,
    progress: ProgressState,
) -> Invocation {
    let args = vec![
        labels.to_string_lossy().into_owned(),
        "--format".to_string(),
        "analysis.csv".to_string(),
        "-o".to_string(),
        csv.to_string_lossy().into_owned(),
    ];

    Invocation::new(
        cfg.programs.convert.clone(),
        args,
        format!("Converting {}", file_name(labels)),
    )
    .with_max_wait(cfg.convert_timeout())
    .with_update_interval(cfg.update_interval())
    .with_progress(progress)
    .with_progress_fn(cfg.progress_fn())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn track_flags_are_passed_verbatim() {
        let cfg = ToolConfig::default();
        let inv = track_invocation(
            &cfg,
            Path::new("/m/face"),
            Path::new("/v/clip_01.mp4"),
            Path::new("/out/labels.v001_clip_01.slp"),
            Mode::Face,
            ProgressState::FULL,
        );

        assert_eq!(inv.program, "sleap-track");
        let joined = inv.args.join(" ");
        assert!(joined.contains(
            "--tracking.tracker flow --tracking.similarity centroid --tracking.match greedy --tracking.kf_node_indices 0,1,2,3,4,5,6,7,8,9,10,11"
        ));
        assert_eq!(inv.args.last().map(String::as_str), Some("/v/clip_01.mp4"));
        assert_eq!(inv.max_wait, Duration::from_secs(14400));
        assert_eq!(inv.description, "Tracking clip_01.mp4");
    }

    #[test]
    fn pupil_mode_uses_its_own_nodes() {
        let cfg = ToolConfig::default();
        let inv = track_invocation(
            &cfg,
            Path::new("m"),
            Path::new("v.mp4"),
            Path::new("o.slp"),
            Mode::Pupil,
            ProgressState::FULL,
        );
        assert!(inv.args.contains(&"0,1,2,3,4,5,6,7".to_string()));
    }

    #[test]
    fn render_args() {
        let cfg = ToolConfig::default();
        let inv = render_invocation(
            &cfg,
            &PathBuf::from("/out/a.slp"),
            &PathBuf::from("/out/a.mp4"),
            120,
            ProgressState::FULL,
        );
        assert_eq!(inv.args, vec!["-o", "/out/a.mp4", "-f", "120", "/out/a.slp"]);
        assert_eq!(inv.max_wait, Duration::from_secs(1800));
    }

    #[test]
    fn convert_args() {
        let cfg = ToolConfig::default();
        let inv = convert_invocation(
            &cfg,
            Path::new("/out/a.slp"),
            Path::new("/out/a.analysis.csv"),
            ProgressState::FULL,
        );
        assert_eq!(inv.program, "sleap-convert");
        assert_eq!(
            inv.args,
            vec!["/out/a.slp", "--format", "analysis.csv", "-o", "/out/a.analysis.csv"]
        );
        assert_eq!(inv.max_wait, Duration::from_secs(600));
        assert_eq!(inv.description, "Converting a.slp");
    }

    #[test]
    fn command_line_quotes_spaces() {
        let inv = Invocation::new("sh", vec!["-c".into(), "echo hi".into()], "demo");
        assert_eq!(inv.command_line(), "sh -c \"echo hi\"");
    }
}
