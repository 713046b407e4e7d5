// src/exec/progress.rs

//! Progress arithmetic shared by the monitor, the task runner and the
//! workflow coordinator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Maps a sub-operation's own 0..=100 range into a slice of the overall
/// 0..=100 scale: `overall = base + sub / 100 * weight`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressState {
    pub base: f64,
    pub weight: f64,
}

impl ProgressState {
    /// The whole 0..=100 range.
    pub const FULL: ProgressState = ProgressState {
        base: 0.0,
        weight: 100.0,
    };

    pub fn new(base: f64, weight: f64) -> Self {
        Self { base, weight }
    }

    /// Slice of `self` belonging to item `index` of `total` equal items.
    ///
    /// On the full range this is `base = index / total * 100`,
    /// `weight = 100 / total`.
    pub fn nested(&self, index: usize, total: usize) -> ProgressState {
        let total = total.max(1) as f64;
        let weight = self.weight / total;
        ProgressState {
            base: self.base + index as f64 * weight,
            weight,
        }
    }

    /// Overall percentage for a sub-progress value (clamped to 0..=100).
    pub fn at(&self, sub_percent: f64) -> f64 {
        let sub = sub_percent.clamp(0.0, 100.0);
        (self.base + sub / 100.0 * self.weight).clamp(0.0, 100.0)
    }

    /// Integer percentage as published on the task channel.
    pub fn percent_at(&self, sub_percent: f64) -> u8 {
        to_percent(self.at(sub_percent))
    }

    pub fn end(&self) -> f64 {
        self.at(100.0)
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        ProgressState::FULL
    }
}

/// Round an overall percentage to the integer published to callers.
///
/// Values are floored so a stage never reports 100 before it is done.
pub fn to_percent(value: f64) -> u8 {
    // Tolerate float noise such as 99.99999999 for an exact 100.
    (value + 1e-9).floor().clamp(0.0, 100.0) as u8
}

/// Estimates a sub-operation's 0..=100 progress from elapsed wall time.
///
/// The external tools do not report completion, so any curve is a guess.
#[derive(Clone)]
pub struct ProgressFn(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl ProgressFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// One percentage point per `seconds_per_percent`, capped at `cap` until
    /// the exit code confirms completion.
    pub fn elapsed_linear(seconds_per_percent: f64, cap: f64) -> Self {
        let divisor = if seconds_per_percent > 0.0 {
            seconds_per_percent
        } else {
            1.0
        };
        Self::new(move |elapsed_secs| (elapsed_secs / divisor).min(cap))
    }

    pub fn percent(&self, elapsed: Duration) -> f64 {
        (self.0)(elapsed.as_secs_f64())
    }
}

impl Default for ProgressFn {
    /// `min(95, elapsed_seconds / 60)`.
    fn default() -> Self {
        Self::elapsed_linear(60.0, 95.0)
    }
}

impl fmt::Debug for ProgressFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressFn(..)")
    }
}

/// `mm:ss` as shown in elapsed-time status lines. Minutes keep growing past
/// 59 rather than rolling into hours.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
