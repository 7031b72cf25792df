//! Post-processing passes over a finished, interpolated series.
//!
//! - Global pressure and temperature extrema (zero means unknown).
//! - 5-point triangular smoothing of the depth curve.
//! - Discrete vertical velocity classification.
//! - Min/max/average depth over time windows centred on each point.

use crate::config::AnalysisConfig;
use crate::series::{DepthWindow, DerivedPoint, ProfileSeries};

/// Vertical speed bucket, ordered from calm to dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, uniffi::Enum)]
pub enum Velocity {
    Stable,
    Slow,
    Moderate,
    Fast,
    Crazy,
}

impl Velocity {
    pub const ALL: [Velocity; 5] = [
        Velocity::Stable,
        Velocity::Slow,
        Velocity::Moderate,
        Velocity::Fast,
        Velocity::Crazy,
    ];

    /// Classify a vertical speed in mm/s, descent positive.
    ///
    /// Ascent and descent share the bucket magnitudes except for the stable
    /// band, which is narrower on the way up.
    pub fn from_speed(mm_per_sec: i32) -> Self {
        match mm_per_sec {
            // faster than 60ft/min up
            s if s < -304 => Velocity::Crazy,
            // 30ft/min
            s if s < -152 => Velocity::Fast,
            // 15ft/min
            s if s < -76 => Velocity::Moderate,
            // 5ft/min
            s if s < -25 => Velocity::Slow,
            s if s < 25 => Velocity::Stable,
            // up to 30ft/min down
            s if s < 152 => Velocity::Slow,
            s if s < 304 => Velocity::Moderate,
            // up to 100ft/min
            s if s < 507 => Velocity::Fast,
            _ => Velocity::Crazy,
        }
    }
}

/// Run every analysis pass over `series`.
pub fn analyze(series: &mut ProfileSeries, config: &AnalysisConfig) {
    update_extrema(series);
    let samples = series.sample_range();
    smooth_depths(&mut series.points, samples.clone());
    classify_velocities(&mut series.points, samples, config.velocity_min_interval_sec);
    compute_depth_windows(&mut series.points, &config.window_half_widths_sec);
}

/// Fold every known pressure and temperature into the series extrema.
///
/// The pressure extrema start from the recorded values of the first
/// cylinder; zero readings never count as a minimum.
pub fn update_extrema(series: &mut ProfileSeries) {
    for point in &series.points {
        if let Some(pressure) = point.pressure_mbar().filter(|p| *p != 0) {
            fold(&mut series.min_pressure_mbar, &mut series.max_pressure_mbar, pressure);
        }
        if let Some(temperature) = point.temperature_mk.filter(|t| *t != 0) {
            fold(
                &mut series.min_temperature_mk,
                &mut series.max_temperature_mk,
                temperature,
            );
        }
    }
}

fn fold(min: &mut Option<i32>, max: &mut Option<i32>, value: i32) {
    if min.map_or(true, |m| value < m) {
        *min = Some(value);
    }
    if max.map_or(true, |m| value > m) {
        *max = Some(value);
    }
}

/// Triangular 5-point smoothing, `(d[-2] + 2d[-1] + 3d[0] + 2d[1] + d[2] + 4) / 9`.
///
/// Only points whose whole window lies inside `samples` are smoothed, so the
/// first two and last two samples keep `smoothed_mm == None`.
pub fn smooth_depths(points: &mut [DerivedPoint], samples: std::ops::Range<usize>) {
    if samples.len() < 5 {
        return;
    }
    for i in samples.start + 2..samples.end - 2 {
        let weighted: i64 = [1, 2, 3, 2, 1]
            .iter()
            .zip(&points[i - 2..=i + 2])
            .map(|(w, p)| w * p.depth_mm as i64)
            .sum();
        points[i].smoothed_mm = Some(((weighted + 4) / 9) as i32);
    }
}

/// Classify the vertical velocity of every sample against its predecessor.
///
/// When the interval is shorter than `min_interval_sec` and the speed would
/// not already be fast, look back for the latest point at least that far in
/// the past and classify over the wider interval instead; closely spaced
/// noisy samples otherwise show up as spikes. The lookback never passes index
/// 0 and only visits points inside the interval, so it is linear in the
/// number of points sharing a timestamp window.
pub fn classify_velocities(
    points: &mut [DerivedPoint],
    samples: std::ops::Range<usize>,
    min_interval_sec: i32,
) {
    for i in samples {
        let dt = points[i].t_sec.saturating_sub(points[i - 1].t_sec);
        if dt == 0 {
            points[i].velocity = Velocity::Stable;
            continue;
        }
        let mut velocity = speed_between(points, i - 1, i);
        if dt < min_interval_sec && velocity < Velocity::Fast {
            let mut past = i.saturating_sub(2);
            while past > 0 && points[i].t_sec.saturating_sub(points[past].t_sec) < min_interval_sec {
                past -= 1;
            }
            velocity = speed_between(points, past, i);
        }
        points[i].velocity = velocity;
    }
}

fn speed_between(points: &[DerivedPoint], from: usize, to: usize) -> Velocity {
    let dt = points[to].t_sec.saturating_sub(points[from].t_sec);
    if dt == 0 {
        return Velocity::Stable;
    }
    Velocity::from_speed(
        points[to]
            .depth_mm
            .saturating_sub(points[from].depth_mm)
            .saturating_div(dt),
    )
}

/// Fill `windows` on every point, one entry per half-width.
pub fn compute_depth_windows(points: &mut [DerivedPoint], half_widths_sec: &[i32]) {
    let windows: Vec<Vec<DepthWindow>> = (0..points.len())
        .map(|i| {
            half_widths_sec
                .iter()
                .map(|half| depth_window(points, i, *half))
                .collect()
        })
        .collect();
    for (point, windows) in points.iter_mut().zip(windows) {
        point.windows = windows;
    }
}

/// Scan back while the previous point is within `half_width_sec`, then forward
/// while still within it. Ties keep the first point seen.
fn depth_window(points: &[DerivedPoint], index: usize, half_width_sec: i32) -> DepthWindow {
    let time = points[index].t_sec;

    let mut start = index;
    while start > 0 && points[start - 1].t_sec >= time.saturating_sub(half_width_sec) {
        start -= 1;
    }

    let (mut min, mut max) = (start, start);
    let mut sum = points[start].depth_mm as i64;
    let mut count: i64 = 1;
    for (p, point) in points.iter().enumerate().skip(start + 1) {
        if point.t_sec > time.saturating_add(half_width_sec) {
            break;
        }
        sum += point.depth_mm as i64;
        count += 1;
        if point.depth_mm < points[min].depth_mm {
            min = p;
        }
        if point.depth_mm > points[max].depth_mm {
            max = p;
        }
    }

    DepthWindow {
        min_index: min as u32,
        max_index: max as u32,
        avg_depth_mm: ((sum + count / 2) / count) as i32,
    }
}
