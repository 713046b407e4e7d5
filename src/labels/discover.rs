// src/labels/discover.rs

//! Finding files by extension in output directories.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::ValidationError;

/// Case-insensitive matcher for file names ending in one of `extensions`
/// (given without the leading dot).
#[derive(Debug, Clone)]
pub struct ExtensionMatcher {
    set: GlobSet,
    extensions: Vec<String>,
}

impl ExtensionMatcher {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        let mut owned = Vec::with_capacity(extensions.len());
        for ext in extensions {
            let ext = ext.as_ref();
            let glob = GlobBuilder::new(&format!("*.{ext}"))
                .case_insensitive(true)
                .literal_separator(true)
                .build()?;
            builder.add(glob);
            owned.push(ext.to_string());
        }
        Ok(Self {
            set: builder.build()?,
            extensions: owned,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.set.is_match(Path::new(name)))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// Files directly inside `dirs` (not recursive) accepted by `matcher`,
/// sorted and de-duplicated.
pub fn find_files(dirs: &[PathBuf], matcher: &ExtensionMatcher) -> Result<Vec<PathBuf>, ValidationError> {
    let mut found = Vec::new();

    for dir in dirs {
        let entries = fs::read_dir(dir).map_err(|e| ValidationError::UnreadableDirectory {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && matcher.matches(&path) {
                found.push(path);
            }
        }
    }

    found.sort();
    found.dedup();
    debug!(count = found.len(), extensions = ?matcher.extensions(), "discovered files");
    Ok(found)
}

/// Like [`find_files`] for a single directory, but unreadable directories
/// count as empty.
pub fn find_files_lenient(dir: &Path, matcher: &ExtensionMatcher) -> Vec<PathBuf> {
    find_files(&[dir.to_path_buf()], matcher).unwrap_or_default()
}
