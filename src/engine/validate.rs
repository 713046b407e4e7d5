// src/engine/validate.rs

//! Input validation. Everything here runs before any process is started.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ToolConfig;
use crate::engine::{DEFAULT_BASE_NAME, ExportParams, RenderParams, Task, TrackParams};
use crate::errors::ValidationError;
use crate::labels::{ExtensionMatcher, find_files};
use crate::types::{ListMismatchPolicy, Mode, VideoFormat};

/// A task whose inputs have been checked and resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedTask {
    Track {
        model: PathBuf,
        mode: Mode,
        base_name: String,
        /// `(video, output_dir)`, one per video.
        pairs: Vec<(PathBuf, PathBuf)>,
    },
    Render {
        labels: Vec<PathBuf>,
        frame_rate: u32,
        format: VideoFormat,
    },
    Export {
        labels: Vec<PathBuf>,
        videos: Vec<PathBuf>,
        base_name: String,
    },
}

impl PreparedTask {
    pub fn item_count(&self) -> usize {
        match self {
            PreparedTask::Track { pairs, .. } => pairs.len(),
            PreparedTask::Render { labels, .. } | PreparedTask::Export { labels, .. } => labels.len(),
        }
    }
}

/// Check `task` against the filesystem and `cfg`.
pub fn prepare(task: &Task, cfg: &ToolConfig) -> Result<PreparedTask, ValidationError> {
    match task {
        Task::Track(p) => prepare_track(p, cfg),
        Task::Render(p) => prepare_render(p, cfg),
        Task::Export(p) => prepare_export(p, cfg),
    }
}

fn base_name_or_default(base_name: &str) -> String {
    let trimmed = base_name.trim();
    if trimmed.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn check_model(model: &Path) -> Result<(), ValidationError> {
    if model.as_os_str().is_empty() {
        return Err(ValidationError::MissingModel);
    }
    if !model.exists() {
        return Err(ValidationError::ModelNotFound(model.to_path_buf()));
    }
    Ok(())
}

pub(crate) fn check_videos(videos: &[PathBuf]) -> Result<(), ValidationError> {
    if videos.is_empty() {
        return Err(ValidationError::NoVideos);
    }
    for video in videos {
        if !video.is_file() {
            return Err(ValidationError::VideoNotFound(video.clone()));
        }
    }
    Ok(())
}

pub(crate) fn check_frame_rate(frame_rate: u32) -> Result<(), ValidationError> {
    if !(1..=240).contains(&frame_rate) {
        return Err(ValidationError::FrameRateOutOfRange(frame_rate));
    }
    Ok(())
}

/// Pair each video with its output directory.
///
/// A single directory is shared by all videos. Otherwise the lists must be
/// the same length, unless `policy` is `Pad`, which repeats the last
/// directory or drops surplus ones.
pub fn pair_outputs(
    videos: &[PathBuf],
    output_dirs: &[PathBuf],
    policy: ListMismatchPolicy,
) -> Result<Vec<(PathBuf, PathBuf)>, ValidationError> {
    let Some(last) = output_dirs.last() else {
        return Err(ValidationError::NoOutputDirectories);
    };

    if output_dirs.len() != 1 && output_dirs.len() != videos.len() {
        match policy {
            ListMismatchPolicy::Reject => {
                return Err(ValidationError::ListMismatch {
                    videos: videos.len(),
                    outputs: output_dirs.len(),
                });
            }
            ListMismatchPolicy::Pad => {
                debug!(
                    videos = videos.len(),
                    outputs = output_dirs.len(),
                    "padding/truncating output directories to match videos"
                );
            }
        }
    }

    Ok(videos
        .iter()
        .enumerate()
        .map(|(i, video)| {
            let dir = output_dirs.get(i).unwrap_or(last);
            let dir = if output_dirs.len() == 1 { last } else { dir };
            (video.clone(), dir.clone())
        })
        .collect())
}

fn prepare_track(p: &TrackParams, cfg: &ToolConfig) -> Result<PreparedTask, ValidationError> {
    check_model(&p.model)?;
    if p.output_dirs.is_empty() {
        return Err(ValidationError::NoOutputDirectories);
    }
    check_videos(&p.videos)?;
    let pairs = pair_outputs(&p.videos, &p.output_dirs, cfg.batch.list_mismatch)?;

    Ok(PreparedTask::Track {
        model: p.model.clone(),
        mode: p.mode,
        base_name: base_name_or_default(&p.base_name),
        pairs,
    })
}

/// Explicit labels, or every labels file found in `output_dirs`.
fn resolve_labels(
    labels: &[PathBuf],
    output_dirs: &[PathBuf],
    cfg: &ToolConfig,
) -> Result<Vec<PathBuf>, ValidationError> {
    if !labels.is_empty() {
        return Ok(labels.to_vec());
    }
    if output_dirs.is_empty() {
        return Err(ValidationError::NoOutputDirectories);
    }

    let extension = cfg.batch.labels_extension.clone();
    let matcher = ExtensionMatcher::new(&[extension.as_str()]).map_err(|e| {
        ValidationError::UnreadableDirectory {
            path: PathBuf::new(),
            message: format!("invalid labels extension '{extension}': {e}"),
        }
    })?;

    let found = find_files(output_dirs, &matcher)?;
    if found.is_empty() {
        return Err(ValidationError::NoLabelsFound {
            extension,
            dirs: output_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(found)
}

fn prepare_render(p: &RenderParams, cfg: &ToolConfig) -> Result<PreparedTask, ValidationError> {
    check_frame_rate(p.frame_rate)?;
    let labels = resolve_labels(&p.labels, &p.output_dirs, cfg)?;
    Ok(PreparedTask::Render {
        labels,
        frame_rate: p.frame_rate,
        format: p.format,
    })
}

fn prepare_export(p: &ExportParams, cfg: &ToolConfig) -> Result<PreparedTask, ValidationError> {
    let labels = resolve_labels(&p.labels, &p.output_dirs, cfg)?;
    Ok(PreparedTask::Export {
        labels,
        videos: p.videos.clone(),
        base_name: base_name_or_default(&p.base_name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn three_videos_two_dirs_is_rejected() {
        let err = pair_outputs(
            &paths(&["a.mp4", "b.mp4", "c.mp4"]),
            &paths(&["o1", "o2"]),
            ListMismatchPolicy::Reject,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::ListMismatch { videos: 3, outputs: 2 });
    }

    #[test]
    fn pad_policy_repeats_last_dir() {
        let pairs = pair_outputs(
            &paths(&["a.mp4", "b.mp4", "c.mp4"]),
            &paths(&["o1", "o2"]),
            ListMismatchPolicy::Pad,
        )
        .unwrap();
        let dirs: Vec<_> = pairs.iter().map(|(_, d)| d.clone()).collect();
        assert_eq!(dirs, paths(&["o1", "o2", "o2"]));
    }

    #[test]
    fn pad_policy_truncates_surplus_dirs() {
        let pairs = pair_outputs(
            &paths(&["a.mp4"]),
            &paths(&["o1", "o2", "o3"]),
            ListMismatchPolicy::Pad,
        )
        .unwrap();
        assert_eq!(pairs, vec![(PathBuf::from("a.mp4"), PathBuf::from("o1"))]);
    }

    #[test]
    fn single_dir_is_shared() {
        let pairs = pair_outputs(
            &paths(&["a.mp4", "b.mp4"]),
            &paths(&["out"]),
            ListMismatchPolicy::Reject,
        )
        .unwrap();
        assert!(pairs.iter().all(|(_, d)| d == Path::new("out")));
    }

    #[test]
    fn equal_lengths_pair_one_to_one() {
        let pairs = pair_outputs(
            &paths(&["a.mp4", "b.mp4"]),
            &paths(&["oa", "ob"]),
            ListMismatchPolicy::Reject,
        )
        .unwrap();
        assert_eq!(pairs[1], (PathBuf::from("b.mp4"), PathBuf::from("ob")));
    }

    #[test]
    fn track_requires_existing_model_and_videos() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.json");
        let video = dir.path().join("clip.mp4");
        let cfg = ToolConfig::default();

        let mut params = TrackParams {
            model: PathBuf::new(),
            videos: vec![video.clone()],
            output_dirs: vec![dir.path().to_path_buf()],
            base_name: String::new(),
            mode: Mode::Face,
        };
        assert_eq!(
            prepare(&Task::Track(params.clone()), &cfg).unwrap_err(),
            ValidationError::MissingModel
        );

        params.model = model.clone();
        assert!(matches!(
            prepare(&Task::Track(params.clone()), &cfg).unwrap_err(),
            ValidationError::ModelNotFound(_)
        ));

        fs::write(&model, b"{}").unwrap();
        assert!(matches!(
            prepare(&Task::Track(params.clone()), &cfg).unwrap_err(),
            ValidationError::VideoNotFound(_)
        ));

        fs::write(&video, b"").unwrap();
        match prepare(&Task::Track(params), &cfg).unwrap() {
            PreparedTask::Track { base_name, pairs, .. } => {
                assert_eq!(base_name, DEFAULT_BASE_NAME);
                assert_eq!(pairs.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn render_discovers_labels_and_checks_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.slp"), b"").unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        let cfg = ToolConfig::default();

        let params = RenderParams {
            labels: vec![],
            output_dirs: vec![dir.path().to_path_buf()],
            frame_rate: 0,
            format: VideoFormat::Mp4,
        };
        assert_eq!(
            prepare(&Task::Render(params.clone()), &cfg).unwrap_err(),
            ValidationError::FrameRateOutOfRange(0)
        );

        let prepared = prepare(
            &Task::Render(RenderParams {
                frame_rate: 30,
                ..params
            }),
            &cfg,
        )
        .unwrap();
        assert_eq!(prepared.item_count(), 1);
    }

    #[test]
    fn export_without_labels_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ToolConfig::default();
        let err = prepare(
            &Task::Export(ExportParams {
                labels: vec![],
                output_dirs: vec![dir.path().to_path_buf()],
                videos: vec![],
                base_name: String::new(),
            }),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::NoLabelsFound { .. }));
    }
}
