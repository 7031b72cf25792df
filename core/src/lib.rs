pub mod analyze;
pub mod config;
pub mod error;
pub mod interpolate;
pub mod models;
pub mod report;
pub mod segments;
pub mod series;

uniffi::setup_scaffolding!();

use tracing::debug;

pub use analyze::Velocity;
pub use config::AnalysisConfig;
pub use error::ProfileError;
pub use models::{CylinderInput, DiveInput, RawSample};
pub use report::{AscentWarning, CylinderUsage, DiveReport, VelocityTime};
pub use segments::{CylinderSegments, PressureSegment};
pub use series::{DepthWindow, DerivedPoint, ProfileSeries};

/// Build the fully analyzed profile series for a dive with default settings.
#[uniffi::export]
pub fn build_series(dive: DiveInput) -> Result<ProfileSeries, ProfileError> {
    build_series_with_config(dive, AnalysisConfig::default())
}

/// Build the fully analyzed profile series for a dive.
///
/// Runs the series builder (with segment tracking), fills missing tank
/// pressures, then runs the analysis passes. Nothing is shared between
/// calls; the returned series is owned by the caller.
#[uniffi::export]
pub fn build_series_with_config(
    dive: DiveInput,
    config: AnalysisConfig,
) -> Result<ProfileSeries, ProfileError> {
    config.validate()?;

    let mut series = ProfileSeries::build(&dive, &config)?;
    interpolate::fill_missing_pressures(&mut series, &config);
    analyze::analyze(&mut series, &config);

    debug!(
        samples = series.sample_count,
        last_index = ?series.last_index,
        max_depth_mm = series.max_depth_mm,
        segments = series
            .pressure_segments
            .iter()
            .map(|c| c.segments.len())
            .sum::<usize>(),
        "built profile series"
    );
    Ok(series)
}

/// Summarize an analyzed dive for reporting.
#[uniffi::export]
pub fn summarize_dive(dive: DiveInput, series: ProfileSeries) -> DiveReport {
    DiveReport::compute(&dive, &series)
}
