//! Derived profile series.
//!
//! A series holds one derived point per raw sample plus four padding points:
//! two leading points so that loops can always look one or two entries back,
//! and two trailing points 20s and 40s past the last sample so windowed
//! statistics never have to special-case the end of the array.

use crate::analyze::Velocity;
use crate::config::AnalysisConfig;
use crate::error::ProfileError;
use crate::models::DiveInput;
use crate::segments::{CylinderSegments, SegmentTracker, TrackedSample};

/// Index of the first real sample in `ProfileSeries::points`.
pub const FIRST_SAMPLE_INDEX: usize = 2;

/// Number of padding points around the real samples.
pub const PADDING_POINTS: usize = 4;

/// Min/max/average depth over a time window centred on a point.
#[derive(Clone, Debug, Default, PartialEq, Eq, uniffi::Record)]
pub struct DepthWindow {
    /// Index of the shallowest point in the window
    pub min_index: u32,
    /// Index of the deepest point in the window
    pub max_index: u32,
    pub avg_depth_mm: i32,
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct DerivedPoint {
    pub t_sec: i32,
    pub depth_mm: i32,
    /// 5-point smoothed depth, only where the full window is real data
    pub smoothed_mm: Option<i32>,
    /// Pressure measured by the active cylinder's sensor
    pub sensor_mbar: Option<i32>,
    /// Estimated pressure where the sensor did not report
    pub interpolated_mbar: Option<i32>,
    pub temperature_mk: Option<i32>,
    pub cylinder_index: u32,
    /// False when the active cylinder changed at this point
    pub same_cylinder: bool,
    /// Index of this sample's segment in the active cylinder's segment list
    pub segment_index: u32,
    pub velocity: Velocity,
    /// One entry per configured window half-width
    pub windows: Vec<DepthWindow>,
}

impl DerivedPoint {
    fn padding(t_sec: i32) -> Self {
        Self {
            t_sec,
            depth_mm: 0,
            smoothed_mm: None,
            sensor_mbar: None,
            interpolated_mbar: None,
            temperature_mk: None,
            cylinder_index: 0,
            same_cylinder: false,
            segment_index: 0,
            velocity: Velocity::Stable,
            windows: Vec::new(),
        }
    }

    /// Sensor pressure if measured, otherwise the interpolated estimate.
    pub fn pressure_mbar(&self) -> Option<i32> {
        self.sensor_mbar.or(self.interpolated_mbar)
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ProfileSeries {
    /// `sample_count + 4` points; real samples start at index 2
    pub points: Vec<DerivedPoint>,
    pub sample_count: u32,
    /// Last index whose depth, or whose predecessor's depth, is non-zero
    pub last_index: Option<u32>,
    pub duration_sec: i32,
    pub mean_depth_mm: i32,
    pub max_depth_mm: i32,
    pub min_pressure_mbar: Option<i32>,
    pub max_pressure_mbar: Option<i32>,
    /// Recorded end pressure of the first cylinder
    pub end_pressure_mbar: Option<i32>,
    pub min_temperature_mk: Option<i32>,
    pub max_temperature_mk: Option<i32>,
    pub pressure_segments: Vec<CylinderSegments>,
}

impl ProfileSeries {
    /// Copy the raw samples into a padded series and track pressure segments.
    ///
    /// Interpolation and analysis are separate passes.
    pub fn build(dive: &DiveInput, config: &AnalysisConfig) -> Result<Self, ProfileError> {
        validate_samples(dive)?;

        let sample_count = dive.samples.len();
        let total = sample_count + PADDING_POINTS;
        let mut points = Vec::new();
        points
            .try_reserve_exact(total)
            .map_err(|_| ProfileError::Allocation {
                points: total as u64,
            })?;
        points.push(DerivedPoint::padding(0));
        points.push(DerivedPoint::padding(0));

        let mut tracker = SegmentTracker::new(&dive.cylinders);
        let mut previous_cylinder: Option<u32> = None;
        let mut previous_depth = 0;
        let mut last_index = None;
        let mut max_depth_mm = 0;
        let mut last_sec = 0;

        for sample in &dive.samples {
            let index = points.len();
            let previous_sec = points[index - 1].t_sec;
            let same_cylinder = previous_cylinder == Some(sample.cylinder_index);
            let sensor_mbar = sample.sensor_pressure();

            let segment_index = tracker.on_sample(TrackedSample {
                cylinder: sample.cylinder_index as usize,
                sensor_mbar,
                t_sec: sample.t_sec,
                pressure_time: config.pressure_time(
                    sample.t_sec.saturating_sub(previous_sec),
                    sample.depth_mm,
                ),
                same_cylinder,
            });

            if sample.depth_mm != 0 || previous_depth != 0 {
                last_index = Some(index as u32);
            }
            previous_depth = sample.depth_mm;
            max_depth_mm = max_depth_mm.max(sample.depth_mm);
            last_sec = sample.t_sec;
            previous_cylinder = Some(sample.cylinder_index);

            points.push(DerivedPoint {
                t_sec: sample.t_sec,
                depth_mm: sample.depth_mm,
                smoothed_mm: None,
                sensor_mbar,
                interpolated_mbar: None,
                temperature_mk: sample.temperature(),
                cylinder_index: sample.cylinder_index,
                same_cylinder,
                segment_index: segment_index as u32,
                velocity: Velocity::Stable,
                windows: Vec::new(),
            });
        }

        points.push(DerivedPoint::padding(
            last_sec.saturating_add(config.first_padding_sec),
        ));
        points.push(DerivedPoint::padding(
            last_sec.saturating_add(config.second_padding_sec),
        ));

        let duration_sec = last_index.map_or(0, |i| points[i as usize].t_sec);
        let first_cylinder = dive.cylinders.first();

        Ok(Self {
            points,
            sample_count: sample_count as u32,
            last_index,
            duration_sec,
            mean_depth_mm: dive.mean_depth_mm,
            max_depth_mm,
            min_pressure_mbar: first_cylinder.and_then(|c| c.recorded_end()),
            max_pressure_mbar: first_cylinder.and_then(|c| c.recorded_start()),
            end_pressure_mbar: first_cylinder.and_then(|c| c.recorded_end()),
            min_temperature_mk: None,
            max_temperature_mk: None,
            pressure_segments: tracker.finish(),
        })
    }

    /// The derived points that correspond to raw samples.
    pub fn samples(&self) -> &[DerivedPoint] {
        &self.points[FIRST_SAMPLE_INDEX..FIRST_SAMPLE_INDEX + self.sample_count as usize]
    }

    /// Index range of the real samples within `points`.
    pub fn sample_range(&self) -> std::ops::Range<usize> {
        FIRST_SAMPLE_INDEX..FIRST_SAMPLE_INDEX + self.sample_count as usize
    }

    pub fn segments_for(&self, cylinder: u32) -> Option<&CylinderSegments> {
        self.pressure_segments
            .iter()
            .find(|c| c.cylinder_index == cylinder)
    }

    /// Time axis extent for display: at least 30 minutes, rounded up to 5
    /// minutes with at least 2.5 minutes to spare.
    pub fn scale_max_time_sec(&self) -> i32 {
        (30 * 60).max(round_up(self.duration_sec.saturating_add(150), 5 * 60))
    }

    /// Depth axis extent for display: at least 30m, rounded up to 10m with at
    /// least 3m to spare.
    pub fn scale_max_depth_mm(&self) -> i32 {
        30000.max(round_up(self.max_depth_mm.saturating_add(3000), 10000))
    }

    /// Temperature axis as `(top, bottom)` in millikelvin, placing the curve in
    /// roughly the lower third. `None` when there is no temperature range.
    pub fn temperature_scale(&self) -> Option<(i32, i32)> {
        let (min, max) = (self.min_temperature_mk?, self.max_temperature_mk?);
        if max <= min {
            return None;
        }
        let delta = max.saturating_sub(min);
        let headroom = if delta > 3000 { 0 } else { 1500 };
        let top = max
            .saturating_add(headroom)
            .saturating_add(delta.saturating_mul(2));
        Some((top, min.saturating_sub(delta / 2)))
    }

    /// Pressure axis top, leaving half the maximum pressure as headroom.
    pub fn pressure_scale_top(&self) -> Option<i32> {
        self.max_pressure_mbar.map(|p| p.saturating_add(p / 2))
    }
}

fn round_up(value: i32, step: i32) -> i32 {
    value.saturating_add(step - 1) / step * step
}

fn validate_samples(dive: &DiveInput) -> Result<(), ProfileError> {
    let cylinders = dive.cylinders.len();
    let mut previous_sec: Option<i32> = None;
    for (i, sample) in dive.samples.iter().enumerate() {
        if sample.cylinder_index as usize >= cylinders {
            return Err(ProfileError::CylinderOutOfRange {
                sample: i as u32,
                cylinder: sample.cylinder_index,
                cylinders: cylinders as u32,
            });
        }
        if let Some(previous) = previous_sec.filter(|p| sample.t_sec < *p) {
            return Err(ProfileError::TimeWentBackwards {
                sample: i as u32,
                sec: sample.t_sec,
                previous_sec: previous,
            });
        }
        previous_sec = Some(sample.t_sec);
    }
    Ok(())
}
