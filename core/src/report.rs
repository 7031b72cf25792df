//! Reporting aggregates for an analyzed dive.
//!
//! Pure functions over a finished series: per-cylinder pressure use and
//! surface consumption, time spent per velocity class, and runs of fast
//! ascent worth warning about.

use crate::analyze::Velocity;
use crate::models::DiveInput;
use crate::series::ProfileSeries;

/// Pressure use of one cylinder over the dive.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct CylinderUsage {
    pub cylinder_index: u32,
    pub description: Option<String>,
    /// First pressure seen in the series (sensor or interpolated)
    pub first_pressure_mbar: Option<i32>,
    pub first_pressure_sec: Option<i32>,
    /// Last pressure seen in the series (sensor or interpolated)
    pub last_pressure_mbar: Option<i32>,
    pub last_pressure_sec: Option<i32>,
    /// Recorded start pressure, else the first pressure in the series
    pub start_mbar: Option<i32>,
    /// Recorded end pressure, else the last pressure in the series
    pub end_mbar: Option<i32>,
    /// Sum of the pressure-time integrals of the cylinder's segments
    pub pressure_time: f64,
    /// Surface air consumption in ml/min, when size and drop are known
    pub sac_ml_min: Option<f64>,
}

impl CylinderUsage {
    pub fn pressure_drop_mbar(&self) -> Option<i32> {
        Some(self.start_mbar? - self.end_mbar?)
    }
}

/// A run of consecutive fast ascent intervals.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct AscentWarning {
    pub start_sec: i32,
    pub end_sec: i32,
    pub start_depth_mm: i32,
    pub end_depth_mm: i32,
    /// Fastest class seen in the run
    pub worst: Velocity,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct VelocityTime {
    pub velocity: Velocity,
    pub seconds: i32,
}

/// Computed report for an analyzed dive.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct DiveReport {
    pub duration_sec: i32,
    pub max_depth_mm: i32,
    /// Copied from the dive record
    pub mean_depth_mm: i32,
    pub cylinders: Vec<CylinderUsage>,
    pub ascent_warnings: Vec<AscentWarning>,
    /// Seconds spent in each velocity class, calmest first
    pub velocity_time: Vec<VelocityTime>,
}

impl DiveReport {
    /// Compute the report from the dive input and its analyzed series.
    pub fn compute(dive: &DiveInput, series: &ProfileSeries) -> Self {
        DiveReport {
            duration_sec: series.duration_sec,
            max_depth_mm: series.max_depth_mm,
            mean_depth_mm: series.mean_depth_mm,
            cylinders: Self::cylinder_usage(dive, series),
            ascent_warnings: Self::ascent_warnings(series),
            velocity_time: Self::velocity_time(series),
        }
    }

    fn cylinder_usage(dive: &DiveInput, series: &ProfileSeries) -> Vec<CylinderUsage> {
        let mut usage: Vec<CylinderUsage> = dive
            .cylinders
            .iter()
            .enumerate()
            .map(|(i, cylinder)| CylinderUsage {
                cylinder_index: i as u32,
                description: cylinder.description.clone(),
                first_pressure_mbar: None,
                first_pressure_sec: None,
                last_pressure_mbar: None,
                last_pressure_sec: None,
                start_mbar: None,
                end_mbar: None,
                pressure_time: series
                    .segments_for(i as u32)
                    .map_or(0.0, |c| c.total_pressure_time()),
                sac_ml_min: None,
            })
            .collect();

        for point in series.samples() {
            let Some(pressure) = point.pressure_mbar() else {
                continue;
            };
            let Some(entry) = usage.get_mut(point.cylinder_index as usize) else {
                continue;
            };
            if entry.first_pressure_mbar.is_none() {
                entry.first_pressure_mbar = Some(pressure);
                entry.first_pressure_sec = Some(point.t_sec);
            }
            entry.last_pressure_mbar = Some(pressure);
            entry.last_pressure_sec = Some(point.t_sec);
        }

        for (entry, cylinder) in usage.iter_mut().zip(&dive.cylinders) {
            entry.start_mbar = cylinder.recorded_start().or(entry.first_pressure_mbar);
            entry.end_mbar = cylinder.recorded_end().or(entry.last_pressure_mbar);
            entry.sac_ml_min = Self::sac(cylinder.size_ml, entry);
        }
        usage
    }

    /// Surface volume used per minute of pressure-weighted time.
    fn sac(size_ml: i32, usage: &CylinderUsage) -> Option<f64> {
        let drop = usage.pressure_drop_mbar()?;
        if size_ml <= 0 || drop <= 0 || usage.pressure_time <= 0.0 {
            return None;
        }
        let used_ml = size_ml as f64 * drop as f64 / 1000.0;
        Some(used_ml / (usage.pressure_time / 60.0))
    }

    fn ascent_warnings(series: &ProfileSeries) -> Vec<AscentWarning> {
        let points = &series.points;
        let mut warnings = Vec::new();
        let mut current: Option<AscentWarning> = None;

        for i in series.sample_range() {
            let (prev, point) = (&points[i - 1], &points[i]);
            let fast_ascent = point.depth_mm < prev.depth_mm && point.velocity >= Velocity::Fast;
            if !fast_ascent {
                warnings.extend(current.take());
                continue;
            }
            match current.as_mut() {
                Some(run) => {
                    run.end_sec = point.t_sec;
                    run.end_depth_mm = point.depth_mm;
                    run.worst = run.worst.max(point.velocity);
                }
                None => {
                    current = Some(AscentWarning {
                        start_sec: prev.t_sec,
                        end_sec: point.t_sec,
                        start_depth_mm: prev.depth_mm,
                        end_depth_mm: point.depth_mm,
                        worst: point.velocity,
                    });
                }
            }
        }
        warnings.extend(current);
        warnings
    }

    fn velocity_time(series: &ProfileSeries) -> Vec<VelocityTime> {
        let mut seconds = [0i32; 5];
        let points = &series.points;
        for i in series.sample_range() {
            let dt = points[i].t_sec.saturating_sub(points[i - 1].t_sec);
            let slot = &mut seconds[points[i].velocity as usize];
            *slot = slot.saturating_add(dt);
        }
        Velocity::ALL
            .iter()
            .zip(seconds)
            .map(|(velocity, seconds)| VelocityTime {
                velocity: *velocity,
                seconds,
            })
            .collect()
    }
}
