// src/engine/export.rs

//! The export kind: best-effort conversion of labeled-data files to CSV.
//!
//! A file that fails to convert is logged and skipped; the task still
//! succeeds and reports how many files were converted.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::engine::TaskOutcome;
use crate::engine::channel::{CancelFlag, TaskReporter};
use crate::engine::runner::TaskRunner;
use crate::exec::ProgressState;
use crate::labels::discover::find_files_lenient;
use crate::labels::naming::stem_of;
use crate::labels::pairing::guess_video_stem;
use crate::labels::{ExtensionMatcher, csv_file_name, resolve_paired_video};

impl TaskRunner {
    pub(crate) async fn run_export(
        &self,
        labels: &[PathBuf],
        videos: &[PathBuf],
        base_name: &str,
        cancel: &CancelFlag,
        reporter: &TaskReporter,
        scope: ProgressState,
    ) -> TaskOutcome {
        let total = labels.len();
        info!(total, "exporting labels to csv");

        let matcher = match ExtensionMatcher::new(self.config().batch.video_extensions.as_slice()) {
            Ok(m) => m,
            Err(err) => {
                return TaskOutcome::Failed(format!("Invalid video extensions: {err}"));
            }
        };

        let mut converted = 0usize;

        for (index, labels_path) in labels.iter().enumerate() {
            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled(format!(
                    "Export cancelled after {converted} of {total} file(s) converted"
                ));
            }

            reporter.log(format!(
                "Converting file {}/{}: {}",
                index + 1,
                total,
                labels_path.display()
            ));

            let csv = csv_path_for(labels_path, videos, base_name, &matcher, reporter);
            let item_scope = scope.nested(index, total);

            let result = self
                .exporter()
                .export(labels_path, &csv, cancel, reporter, item_scope)
                .await;

            match result {
                Ok(()) => {
                    converted += 1;
                    reporter.log(format!("Saved CSV: {}", csv.display()));
                }
                Err(err) if cancel.is_cancelled() => {
                    let reason = format!("{err:#}");
                    debug!(labels = %labels_path.display(), %reason, "export interrupted");
                }
                Err(err) => {
                    warn!(labels = %labels_path.display(), error = %err, "export failed");
                    reporter.log(format!(
                        "[ERROR] Failed to convert {}: {err:#}",
                        labels_path.display()
                    ));
                }
            }

            if cancel.is_cancelled() {
                return TaskOutcome::Cancelled(format!(
                    "Export cancelled during file {} of {total}; {converted} file(s) converted",
                    index + 1
                ));
            }

            reporter.progress(item_scope.percent_at(100.0));
        }

        TaskOutcome::Succeeded(format!(
            "Converted {converted} of {total} file(s) to CSV."
        ))
    }
}

/// CSV destination for `labels`, next to it and named after its source video.
///
/// Candidates are the caller's videos plus any videos sitting beside the
/// labels file. Without a match the video name is guessed from the labels
/// name itself.
fn csv_path_for(
    labels: &Path,
    videos: &[PathBuf],
    base_name: &str,
    matcher: &ExtensionMatcher,
    reporter: &TaskReporter,
) -> PathBuf {
    let dir = labels.parent().unwrap_or_else(|| Path::new("."));

    // Rendered visualizations live next to the labels and carry the naming
    // template; they are never source videos.
    let mut candidates = videos.to_vec();
    candidates.extend(
        find_files_lenient(dir, matcher)
            .into_iter()
            .filter(|v| base_name.is_empty() || !stem_of(v).starts_with(base_name)),
    );

    let video_stem = match resolve_paired_video(labels, &candidates, base_name) {
        Some(video) => stem_of(&video),
        None => {
            let labels_stem = stem_of(labels);
            let guessed = guess_video_stem(&labels_stem, base_name);
            let stem = if guessed.is_empty() { labels_stem } else { guessed };
            reporter.log(format!(
                "No matching video found for {}; naming CSV after '{stem}'",
                labels.display()
            ));
            stem
        }
    };

    dir.join(csv_file_name(base_name, &video_stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::channel::task_channel;
    use std::fs;

    #[test]
    fn csv_goes_next_to_labels_and_uses_video_stem() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.v001_clip_01.slp");
        fs::write(&labels, b"").unwrap();
        fs::write(dir.path().join("clip_01.mp4"), b"").unwrap();

        let (reporter, _completion, _rx) = task_channel();
        let matcher = ExtensionMatcher::new(&["mp4"]).unwrap();
        let csv = csv_path_for(&labels, &[], "labels.v001", &matcher, &reporter);
        assert_eq!(
            csv,
            dir.path().join("labels.v001.000_clip_01.analysis.csv")
        );
    }

    #[test]
    fn rendered_videos_are_not_pairing_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.v001_clip_01.slp");
        fs::write(dir.path().join("labels.v001_clip_01.mp4"), b"").unwrap();

        let (reporter, _completion, _rx) = task_channel();
        let matcher = ExtensionMatcher::new(&["mp4"]).unwrap();
        let csv = csv_path_for(&labels, &[], "labels.v001", &matcher, &reporter);
        assert_eq!(
            csv.file_name().unwrap().to_string_lossy(),
            "labels.v001.000_clip_01.analysis.csv"
        );
    }

    #[test]
    fn unmatched_labels_fall_back_to_guessed_stem() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.v001_session_3.slp");

        let (reporter, _completion, mut rx) = task_channel();
        let matcher = ExtensionMatcher::new(&["mp4"]).unwrap();
        let csv = csv_path_for(&labels, &[], "labels.v001", &matcher, &reporter);
        assert_eq!(
            csv.file_name().unwrap().to_string_lossy(),
            "labels.v001.000_session_3.analysis.csv"
        );
        assert!(rx.try_recv().is_ok());
    }
}
