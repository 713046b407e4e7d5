// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawToolConfig, ToolConfig};
use crate::errors::Result;

/// Read and deserialize a tool configuration file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawToolConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawToolConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load and validate a tool configuration file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ToolConfig> {
    let raw_config = load_from_path(&path)?;
    let config = ToolConfig::try_from(raw_config)?;
    Ok(config)
}

/// Like [`load_and_validate`], but a missing file yields the defaults.
///
/// A file that exists but cannot be parsed or validated is still an error.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ToolConfig> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no tool config file; using defaults");
            Ok(ToolConfig::default())
        }
        _ => load_and_validate(path),
    }
}

/// `sleapbatch.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("sleapbatch.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.programs.render, "sleap-render");
    }

    #[test]
    fn values_from_file_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[programs]
track = "/opt/sleap/bin/sleap-track"

[timeouts]
render_secs = 60

[batch]
list_mismatch = "pad"
"#
        )
        .unwrap();

        let cfg = load_or_default(file.path()).unwrap();
        assert_eq!(cfg.programs.track, "/opt/sleap/bin/sleap-track");
        assert_eq!(cfg.timeouts.render_secs, 60);
        assert_eq!(cfg.timeouts.track_secs, 14400);
        assert_eq!(cfg.batch.list_mismatch, crate::types::ListMismatchPolicy::Pad);
    }

    #[test]
    fn broken_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[timeouts\n").unwrap();
        assert!(load_or_default(file.path()).is_err());
    }
}
