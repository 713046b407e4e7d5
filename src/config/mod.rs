// src/config/mod.rs

//! Configuration for sleapbatch.
//!
//! - Tool configuration (`model.rs`, `loader.rs`, `validate.rs`): external
//!   program names, timeouts, progress curve and batch policies, read from
//!   an optional TOML file.
//! - Persisted user settings (`settings.rs`): the last used model, kept in a
//!   JSON document in the user's home directory.

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    BatchSection, ProgramsSection, ProgressSection, RawToolConfig, TimeoutsSection,
    ToolConfig, TrackingSection,
};
pub use settings::{Settings, SettingsStore};
