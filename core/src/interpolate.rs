//! Missing tank pressure estimation.
//!
//! Gas consumption is roughly proportional to time weighted by ambient
//! pressure, so across a sensor gap the known pressure drop is spread over
//! the samples in proportion to each interval's pressure-time weight rather
//! than linearly in wall-clock time. Estimates go into `interpolated_mbar`;
//! sensor readings are never overwritten.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::segments::PressureSegment;
use crate::series::ProfileSeries;

/// Cached lookup for the segment the walk is currently inside.
#[derive(Clone, Copy, Debug)]
struct GapRun {
    cylinder: usize,
    segment: usize,
    /// Pressure change per unit of pressure-time; `None` when the gap never
    /// resolves to an end pressure
    rate: Option<f64>,
}

/// Fill `interpolated_mbar` on every sample without a sensor reading whose
/// enclosing gap has a resolved end pressure.
pub fn fill_missing_pressures(series: &mut ProfileSeries, config: &AnalysisConfig) {
    let samples = series.sample_range();
    let ProfileSeries {
        points,
        pressure_segments,
        ..
    } = series;

    // Running pressure per cylinder, unrounded so long gaps don't drift.
    let mut current: Vec<Option<f64>> = pressure_segments
        .iter()
        .map(|c| c.segments.first().and_then(|s| s.start_mbar).map(f64::from))
        .collect();
    let mut run: Option<GapRun> = None;

    for i in samples {
        let previous_sec = points[i - 1].t_sec;
        let point = &mut points[i];
        let cylinder = point.cylinder_index as usize;

        if let Some(reading) = point.sensor_mbar {
            current[cylinder] = Some(reading as f64);
            continue;
        }

        let segments = &pressure_segments[cylinder].segments;
        let segment = point.segment_index as usize;
        if segment >= segments.len() {
            continue;
        }

        let stale = run.map_or(true, |r| r.cylinder != cylinder || r.segment != segment);
        if stale {
            let rate = consumption_rate(&segments[segment..], current[cylinder]);
            if rate.is_none() {
                debug!(
                    cylinder,
                    t_sec = point.t_sec,
                    "no closing pressure for sensor gap, skipping interpolation"
                );
            }
            run = Some(GapRun {
                cylinder,
                segment,
                rate,
            });
        }

        let (Some(rate), Some(pressure)) = (run.and_then(|r| r.rate), current[cylinder]) else {
            continue;
        };
        let weighted = config.pressure_time(point.t_sec.saturating_sub(previous_sec), point.depth_mm);
        let estimate = pressure + weighted * rate;
        point.interpolated_mbar = Some(estimate.round() as i32);
        current[cylinder] = Some(estimate);
    }
}

/// Pressure change per unit of pressure-time from `start_mbar` to the end of
/// the first segment in `segments` that has a resolved end pressure.
///
/// Unresolved segments in front of it are merged into the run.
fn consumption_rate(segments: &[PressureSegment], start_mbar: Option<f64>) -> Option<f64> {
    let start = start_mbar?;
    let mut pressure_time = 0.0;
    for segment in segments {
        pressure_time += segment.pressure_time;
        if let Some(end) = segment.end_mbar {
            if pressure_time == 0.0 {
                return None;
            }
            return Some((end as f64 - start) / pressure_time);
        }
    }
    None
}
