// src/config/settings.rs

//! Small per-user settings document remembered between runs.
//!
//! Reading never fails: a missing or corrupt file yields the defaults.
//! Writing is best-effort and failures are only logged.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File name of the settings document inside the user's home directory.
pub const SETTINGS_FILE_NAME: &str = ".sleapgui_settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub last_model_path: String,
}

impl Settings {
    pub fn last_model(&self) -> Option<PathBuf> {
        if self.last_model_path.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.last_model_path))
        }
    }
}

/// Settings bound to a file location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.sleapgui_settings.json`, or `None` if there is no home directory.
    pub fn per_user() -> Option<Self> {
        BaseDirs::new().map(|dirs| Self::new(dirs.home_dir().join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no settings file; using defaults");
                return Settings::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings file");
            Settings::default()
        })
    }

    pub fn save(&self, settings: &Settings) {
        let result = serde_json::to_string(settings)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));

        if let Err(e) = result {
            debug!(path = %self.path.display(), error = %e, "failed to save settings");
        }
    }

    /// Remember `model` as the last used model path.
    pub fn remember_model(&self, model: &Path) {
        let mut settings = self.load();
        settings.last_model_path = model.to_string_lossy().into_owned();
        self.save(&settings);
    }
}
