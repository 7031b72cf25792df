//! Tunable constants for profile analysis.
//!
//! The defaults reproduce the behaviour dive log consumers expect; hosts may
//! deserialize an override, but every field falls back to its default.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// Half-widths of the min/max/average depth windows, in seconds.
///
/// These are 90-second multiples, not whole minutes. Rendering thresholds
/// downstream are tuned against these exact values.
pub const DEFAULT_WINDOW_HALF_WIDTHS_SEC: [i32; 3] = [90, 180, 270];

/// Intervals shorter than this are widened before velocity classification.
pub const DEFAULT_VELOCITY_MIN_INTERVAL_SEC: i32 = 15;

/// Offsets of the two trailing padding points past the last real sample.
pub const DEFAULT_PADDING_SEC: [i32; 2] = [20, 40];

/// Upper bound for window half-widths and padding offsets: one day.
pub const MAX_OFFSET_SEC: i32 = 24 * 60 * 60;

/// Depth (mm) adding one bar of ambient pressure to the pressure-time weight.
pub const DEFAULT_DEPTH_MM_PER_BAR: f64 = 10000.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Half-widths of the windowed depth statistics, in seconds.
    pub window_half_widths_sec: Vec<i32>,
    /// Minimum interval used for vertical velocity classification.
    pub velocity_min_interval_sec: i32,
    /// Offset of the first trailing padding point.
    pub first_padding_sec: i32,
    /// Offset of the second trailing padding point.
    pub second_padding_sec: i32,
    /// Depth per bar of ambient pressure for the pressure-time integral.
    pub depth_mm_per_bar: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_half_widths_sec: DEFAULT_WINDOW_HALF_WIDTHS_SEC.to_vec(),
            velocity_min_interval_sec: DEFAULT_VELOCITY_MIN_INTERVAL_SEC,
            first_padding_sec: DEFAULT_PADDING_SEC[0],
            second_padding_sec: DEFAULT_PADDING_SEC[1],
            depth_mm_per_bar: DEFAULT_DEPTH_MM_PER_BAR,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.window_half_widths_sec.is_empty() {
            return Err(ProfileError::InvalidConfig(
                "at least one depth window is required".to_string(),
            ));
        }
        if let Some(width) = self
            .window_half_widths_sec
            .iter()
            .find(|w| **w <= 0 || **w > MAX_OFFSET_SEC)
        {
            return Err(ProfileError::InvalidConfig(format!(
                "window half-width must be between 1 and {MAX_OFFSET_SEC}s, got {width}"
            )));
        }
        if !(0..=MAX_OFFSET_SEC).contains(&self.velocity_min_interval_sec) {
            return Err(ProfileError::InvalidConfig(format!(
                "velocity interval must be between 0 and {MAX_OFFSET_SEC}s, got {}",
                self.velocity_min_interval_sec
            )));
        }
        if self.first_padding_sec <= 0
            || self.second_padding_sec <= self.first_padding_sec
            || self.second_padding_sec > MAX_OFFSET_SEC
        {
            return Err(ProfileError::InvalidConfig(format!(
                "padding offsets must be increasing within 1..={MAX_OFFSET_SEC}s, got {} and {}",
                self.first_padding_sec, self.second_padding_sec
            )));
        }
        if !(self.depth_mm_per_bar.is_finite() && self.depth_mm_per_bar > 0.0) {
            return Err(ProfileError::InvalidConfig(format!(
                "depth per bar must be positive, got {}",
                self.depth_mm_per_bar
            )));
        }
        Ok(())
    }

    /// Duration weighted by the ambient pressure factor at `depth_mm`.
    pub fn pressure_time(&self, dt_sec: i32, depth_mm: i32) -> f64 {
        dt_sec as f64 * (1.0 + depth_mm as f64 / self.depth_mm_per_bar)
    }
}
