// src/labels/pairing.rs

//! Pairing a labeled-data file with the video it was tracked from.
//!
//! Labeled-data files do not record their source video in their name in any
//! structured way, so this is string matching:
//!
//! 1. Containment: a candidate whose file stem occurs inside the labels file
//!    stem. Candidates in the labels file's own directory win, then the
//!    longest stem (so `clip_10` beats `clip_1`), then input order.
//! 2. Template splitting: remove the naming template (or, failing that, each
//!    of its dot-separated parts) from the labels stem, trim separators and a
//!    leading `NNN_` index, and look for a candidate with exactly that stem.
//!
//! Similar names can still mis-pair; keep this function the only place that
//! knows the rules.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::labels::naming::stem_of;

static LEADING_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}_").expect("static regex"));

/// Find the video `labels` was produced from among `candidates`.
pub fn resolve_paired_video(
    labels: &Path,
    candidates: &[PathBuf],
    base_name: &str,
) -> Option<PathBuf> {
    let labels_stem = stem_of(labels);
    if labels_stem.is_empty() {
        return None;
    }
    let labels_dir = labels.parent();

    if let Some(found) = by_containment(&labels_stem, labels_dir, candidates) {
        return Some(found.clone());
    }

    let guess = guess_video_stem(&labels_stem, base_name);
    if guess.is_empty() {
        return None;
    }

    candidates
        .iter()
        .filter(|c| stem_of(c) == guess)
        .max_by_key(|c| co_located(c, labels_dir))
        .cloned()
}

fn co_located(candidate: &Path, labels_dir: Option<&Path>) -> bool {
    labels_dir.is_some() && candidate.parent() == labels_dir
}

fn by_containment<'a>(
    labels_stem: &str,
    labels_dir: Option<&Path>,
    candidates: &'a [PathBuf],
) -> Option<&'a PathBuf> {
    let mut best: Option<(&PathBuf, bool, usize)> = None;

    for candidate in candidates {
        let stem = stem_of(candidate);
        if stem.is_empty() || !labels_stem.contains(stem.as_str()) {
            continue;
        }
        let local = co_located(candidate, labels_dir);
        let len = stem.len();

        // Strictly better only, so ties keep the earliest candidate.
        let better = match best {
            None => true,
            Some((_, best_local, best_len)) => (local, len) > (best_local, best_len),
        };
        if better {
            best = Some((candidate, local, len));
        }
    }

    best.map(|(c, _, _)| c)
}

/// Best guess at the video stem hidden in a labels stem.
///
/// `labels.v001_clip_01` with template `labels.v001` gives `clip_01`;
/// so does `labels.v001.000_clip_01`.
pub fn guess_video_stem(labels_stem: &str, base_name: &str) -> String {
    let base_name = base_name.trim();
    let residue = if !base_name.is_empty() && labels_stem.contains(base_name) {
        labels_stem.split(base_name).collect::<Vec<_>>().join("")
    } else {
        base_name
            .split('.')
            .filter(|part| !part.is_empty())
            .fold(labels_stem.to_string(), |acc, part| acc.replacen(part, "", 1))
    };

    let trimmed = residue.trim_matches(|c| c == '.' || c == '_');
    let without_index = LEADING_INDEX.replace(trimmed, "");
    without_index.trim_matches(|c| c == '.' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn containment_finds_the_source_video() {
        let candidates = paths(&["/v/clip_01.mp4", "/v/clip_02.mp4"]);
        let found = resolve_paired_video(
            Path::new("/out/labels.v001_clip_02.slp"),
            &candidates,
            "labels.v001",
        );
        assert_eq!(found, Some(PathBuf::from("/v/clip_02.mp4")));
    }

    #[test]
    fn longest_contained_stem_wins() {
        let candidates = paths(&["/v/clip_1.mp4", "/v/clip_10.mp4"]);
        let found =
            resolve_paired_video(Path::new("/out/labels_clip_10.slp"), &candidates, "labels");
        assert_eq!(found, Some(PathBuf::from("/v/clip_10.mp4")));
    }

    #[test]
    fn co_located_candidate_beats_longer_remote_one() {
        let candidates = paths(&["/elsewhere/session_a1.mp4", "/out/a1.mp4"]);
        let found = resolve_paired_video(
            Path::new("/out/labels_session_a1.slp"),
            &candidates,
            "labels",
        );
        assert_eq!(found, Some(PathBuf::from("/out/a1.mp4")));
    }

    #[test]
    fn template_split_recovers_indexed_names() {
        assert_eq!(guess_video_stem("labels.v001.000_clip_01", "labels.v001"), "clip_01");
        assert_eq!(guess_video_stem("labels.v001_clip_01", "labels.v001"), "clip_01");
    }

    #[test]
    fn template_split_falls_back_to_template_parts() {
        // Template was edited after tracking; its parts still appear.
        assert_eq!(guess_video_stem("labels_v001_mouse3", "labels.v001"), "mouse3");
    }

    #[test]
    fn no_match_is_none() {
        let candidates = paths(&["/v/other.mp4"]);
        assert_eq!(
            resolve_paired_video(Path::new("/out/labels.v001_clip.slp"), &candidates, "labels.v001"),
            None
        );
    }

    #[test]
    fn empty_candidates_is_none() {
        assert_eq!(
            resolve_paired_video(Path::new("/out/labels.v001_clip.slp"), &[], "labels.v001"),
            None
        );
    }
}
