// src/config/validate.rs

use crate::config::model::{RawToolConfig, ToolConfig};
use crate::errors::{Result, SleapBatchError};

impl TryFrom<RawToolConfig> for ToolConfig {
    type Error = SleapBatchError;

    fn try_from(raw: RawToolConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ToolConfig::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawToolConfig) -> Result<()> {
    validate_programs(cfg)?;
    validate_timeouts(cfg)?;
    validate_progress(cfg)?;
    validate_tracking(cfg)?;
    validate_batch(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> SleapBatchError {
    SleapBatchError::ConfigError(msg.into())
}

fn validate_programs(cfg: &RawToolConfig) -> Result<()> {
    let programs = [
        ("track", &cfg.programs.track),
        ("render", &cfg.programs.render),
        ("convert", &cfg.programs.convert),
    ];
    for (key, program) in programs {
        if program.trim().is_empty() {
            return Err(config_error(format!(
                "[programs].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_timeouts(cfg: &RawToolConfig) -> Result<()> {
    let t = &cfg.timeouts;
    let values = [
        ("track_secs", t.track_secs),
        ("render_secs", t.render_secs),
        ("convert_secs", t.convert_secs),
        ("update_interval_secs", t.update_interval_secs),
        ("poll_interval_ms", t.poll_interval_ms),
        ("kill_grace_ms", t.kill_grace_ms),
    ];
    for (key, value) in values {
        if value == 0 {
            return Err(config_error(format!(
                "[timeouts].{key} must be >= 1 (got 0)"
            )));
        }
    }
    Ok(())
}

fn validate_progress(cfg: &RawToolConfig) -> Result<()> {
    let p = &cfg.progress;
    if !(p.seconds_per_percent > 0.0) {
        return Err(config_error(format!(
            "[progress].seconds_per_percent must be > 0 (got {})",
            p.seconds_per_percent
        )));
    }
    if !(p.cap > 0.0 && p.cap <= 100.0) {
        return Err(config_error(format!(
            "[progress].cap must be in (0, 100] (got {})",
            p.cap
        )));
    }
    Ok(())
}

fn validate_tracking(cfg: &RawToolConfig) -> Result<()> {
    if cfg.tracking.face.is_empty() {
        return Err(config_error("[tracking].face must list at least one node index"));
    }
    if cfg.tracking.pupil.is_empty() {
        return Err(config_error("[tracking].pupil must list at least one node index"));
    }
    Ok(())
}

fn validate_batch(cfg: &RawToolConfig) -> Result<()> {
    let b = &cfg.batch;
    check_extension("labels_extension", &b.labels_extension)?;
    if b.video_extensions.is_empty() {
        return Err(config_error(
            "[batch].video_extensions must list at least one extension",
        ));
    }
    for ext in &b.video_extensions {
        check_extension("video_extensions", ext)?;
    }
    Ok(())
}

fn check_extension(key: &str, ext: &str) -> Result<()> {
    if ext.is_empty() {
        return Err(config_error(format!("[batch].{key} must not be empty")));
    }
    if ext.starts_with('.') {
        return Err(config_error(format!(
            "[batch].{key}: write extensions without the leading dot (got '{ext}')"
        )));
    }
    if ext.contains(['/', '\\', '*', '{', '}']) {
        return Err(config_error(format!(
            "[batch].{key}: invalid extension '{ext}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<ToolConfig> {
        let raw: RawToolConfig = toml::from_str(toml_src)?;
        ToolConfig::try_from(raw)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.programs.track, "sleap-track");
        assert_eq!(cfg.timeouts.track_secs, 14400);
        assert_eq!(cfg.timeouts.render_secs, 1800);
        assert_eq!(cfg.tracking.face.len(), 12);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = parse("[timeouts]\npoll_interval_ms = 0\n").unwrap_err();
        match err {
            SleapBatchError::ConfigError(msg) => assert!(msg.contains("poll_interval_ms")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn zero_kill_grace_is_rejected() {
        let err = parse("[timeouts]\nkill_grace_ms = 0\n").unwrap_err();
        match err {
            SleapBatchError::ConfigError(msg) => assert!(msg.contains("kill_grace_ms"), "{msg}"),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn misspelled_key_inside_a_section_is_a_parse_error() {
        let err = parse("[progress]\ncaps = 90.0\n").unwrap_err();
        assert!(matches!(err, SleapBatchError::TomlError(_)), "{err:?}");
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let err = parse("[batch]\nlabels_extension = \".slp\"\n").unwrap_err();
        assert!(matches!(err, SleapBatchError::ConfigError(_)));
    }

    #[test]
    fn cap_above_100_is_rejected() {
        assert!(parse("[progress]\ncap = 120.0\n").is_err());
    }

    #[test]
    fn empty_node_list_is_rejected() {
        assert!(parse("[tracking]\npupil = []\n").is_err());
    }

    #[test]
    fn unknown_section_is_a_parse_error() {
        let err = parse("[watch]\npatterns = []\n").unwrap_err();
        assert!(matches!(err, SleapBatchError::TomlError(_)));
    }
}
