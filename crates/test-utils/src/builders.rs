#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sleapbatch::config::{RawToolConfig, ToolConfig};
use sleapbatch::types::ListMismatchPolicy;
use tempfile::TempDir;

/// Builder for `ToolConfig` to simplify test setup.
pub struct ToolConfigBuilder {
    config: RawToolConfig,
}

impl ToolConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawToolConfig::default(),
        }
    }

    pub fn with_programs(mut self, track: &str, render: &str) -> Self {
        self.config.programs.track = track.to_string();
        self.config.programs.render = render.to_string();
        self
    }

    pub fn with_convert_program(mut self, convert: &str) -> Self {
        self.config.programs.convert = convert.to_string();
        self
    }

    pub fn with_list_mismatch(mut self, policy: ListMismatchPolicy) -> Self {
        self.config.batch.list_mismatch = policy;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.poll_interval_ms = ms;
        self
    }

    pub fn with_update_interval_secs(mut self, secs: u64) -> Self {
        self.config.timeouts.update_interval_secs = secs;
        self
    }

    pub fn build(self) -> ToolConfig {
        ToolConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ToolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Temporary directory laid out like a user's project: a model file, input
/// videos and output directories.
pub struct Workspace {
    dir: TempDir,
    model: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let model = dir.path().join("models").join("training_config.json");
        fs::create_dir_all(model.parent().unwrap()).unwrap();
        fs::write(&model, b"{}").unwrap();
        Self { dir, model }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn model(&self) -> PathBuf {
        self.model.clone()
    }

    /// Create an (empty) input video under `videos/`.
    pub fn video(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("videos").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"").unwrap();
        path
    }

    /// Path of an output directory; created only when `create` is set.
    pub fn output_dir(&self, name: &str, create: bool) -> PathBuf {
        let path = self.dir.path().join(name);
        if create {
            fs::create_dir_all(&path).unwrap();
        }
        path
    }

    /// Create a file `name` inside `dir`.
    pub fn file_in(&self, dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
