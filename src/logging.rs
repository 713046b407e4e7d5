// src/logging.rs

//! Logging setup for `sleapbatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SLEAPBATCH_LOG` environment variable: a plain level ("info",
//!    "warning") or `EnvFilter` directives ("sleapbatch::exec=debug,warn")
//! 3. default to `info`
//!
//! Diagnostics go to STDERR. STDOUT carries the task log the user reads.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "SLEAPBATCH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(value) = rejected {
        tracing::warn!(%value, "ignoring unparsable {LOG_ENV_VAR}; logging at info");
    }
    Ok(())
}

/// The filter to install, plus the env value if it had to be ignored.
fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(lvl) = cli_level {
        return (level_filter(level_from_log_level(lvl)), None);
    }

    let Some(value) = env_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return (level_filter(tracing::Level::INFO), None);
    };

    if let Some(level) = parse_level_str(value) {
        return (level_filter(level), None);
    }
    match EnvFilter::try_new(value) {
        Ok(filter) => (filter, None),
        Err(_) => (level_filter(tracing::Level::INFO), Some(value.to_string())),
    }
}

fn level_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy("")
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_env_levels() {
        assert_eq!(parse_level_str(" Warning "), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("trace"), Some(tracing::Level::TRACE));
        assert_eq!(parse_level_str("verbose"), None);
    }

    #[test]
    fn cli_level_wins_over_env() {
        let (filter, rejected) = build_filter(Some(LogLevel::Error), Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
        assert!(rejected.is_none());
    }

    #[test]
    fn env_accepts_per_target_directives() {
        let (filter, rejected) = build_filter(None, Some("sleapbatch::exec=debug,warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(rejected.is_none());
    }

    #[test]
    fn bad_directives_fall_back_to_info() {
        let (filter, rejected) = build_filter(None, Some("sleapbatch=loud"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(rejected.as_deref(), Some("sleapbatch=loud"));
    }

    #[test]
    fn unset_env_means_info() {
        let (filter, _) = build_filter(None, None);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
