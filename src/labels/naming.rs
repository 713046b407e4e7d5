// src/labels/naming.rs

//! File naming conventions shared by the task kinds.
//!
//! Downstream consumers expect the exported CSV names in exactly this shape,
//! so changes here are breaking.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::VideoFormat;

static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("_{2,}").expect("static regex"));

static UNDERSCORE_BEFORE_DOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+\.").expect("static regex"));

/// Collapse `__` runs into one `_` and drop underscores directly before a dot.
pub fn tidy_separators(name: &str) -> String {
    let collapsed = REPEATED_UNDERSCORES.replace_all(name, "_");
    UNDERSCORE_BEFORE_DOT.replace_all(&collapsed, ".").into_owned()
}

/// `"{base_name}.000_{video_base_name}.analysis.csv"`, tidied.
///
/// `labels.v001` + `clip_01` gives `labels.v001.000_clip_01.analysis.csv`.
pub fn csv_file_name(base_name: &str, video_base_name: &str) -> String {
    tidy_separators(&format!("{base_name}.000_{video_base_name}.analysis.csv"))
}

/// Final path component for display, or the whole path if there is none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem as an owned string (`/a/clip_01.mp4` gives `clip_01`).
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Where the tracker writes the labeled data for `video`:
/// `{output_dir}/{base_name}_{video_stem}.{labels_extension}`.
pub fn track_output_path(
    output_dir: &Path,
    base_name: &str,
    video: &Path,
    labels_extension: &str,
) -> PathBuf {
    let stem = stem_of(video);
    let name = if base_name.is_empty() {
        format!("{stem}.{labels_extension}")
    } else {
        tidy_separators(&format!("{base_name}_{stem}.{labels_extension}"))
    };
    output_dir.join(name)
}

/// Sibling of `labels` with the container extension swapped in.
pub fn render_output_path(labels: &Path, format: VideoFormat) -> PathBuf {
    labels.with_extension(format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_name_for_default_template() {
        assert_eq!(
            csv_file_name("labels.v001", "clip_01"),
            "labels.v001.000_clip_01.analysis.csv"
        );
    }

    #[test]
    fn csv_name_collapses_underscores() {
        assert_eq!(
            csv_file_name("labels_", "_clip"),
            "labels.000_clip.analysis.csv"
        );
        assert_eq!(
            csv_file_name("labels.v001", "clip__01_"),
            "labels.v001.000_clip_01.analysis.csv"
        );
    }

    #[test]
    fn track_output_is_named_after_template_and_video() {
        let p = track_output_path(
            Path::new("/out"),
            "labels.v001",
            Path::new("/videos/clip_01.mp4"),
            "slp",
        );
        assert_eq!(p, PathBuf::from("/out/labels.v001_clip_01.slp"));
    }

    #[test]
    fn track_output_without_template_uses_video_stem() {
        let p = track_output_path(Path::new("/out"), "", Path::new("/v/a.avi"), "slp");
        assert_eq!(p, PathBuf::from("/out/a.slp"));
    }

    #[test]
    fn render_output_swaps_extension() {
        assert_eq!(
            render_output_path(Path::new("/out/x.slp"), VideoFormat::Avi),
            PathBuf::from("/out/x.avi")
        );
    }
}
