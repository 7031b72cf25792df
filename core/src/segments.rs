//! Per-cylinder pressure segment tracking.
//!
//! While the series builder walks the raw samples, every cylinder gets an
//! ordered list of segments: stretches of time during which it was the
//! active cylinder and its sensor was continuously reporting (or continuously
//! silent). Each segment accumulates a pressure-time integral, the duration
//! of its intervals weighted by the ambient pressure factor, which later lets
//! the interpolator spread a known pressure drop over a sensor gap.

use tracing::trace;

use crate::models::CylinderInput;

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct PressureSegment {
    /// Pressure when the segment opened, if known
    pub start_mbar: Option<i32>,
    /// Pressure when the segment closed; deferred for sensor gaps
    pub end_mbar: Option<i32>,
    pub start_sec: i32,
    /// Set when the segment closes
    pub end_sec: Option<i32>,
    /// Sum of `dt * (1 + depth / 10m)` over the intervals of this segment
    pub pressure_time: f64,
    /// Whether the cylinder's sensor reported during this segment
    pub sensor_reporting: bool,
}

impl PressureSegment {
    fn open(start_mbar: Option<i32>, start_sec: i32, sensor_reporting: bool) -> Self {
        Self {
            start_mbar,
            end_mbar: None,
            start_sec,
            end_sec: None,
            pressure_time: 0.0,
            sensor_reporting,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.end_mbar.is_some()
    }
}

/// All segments of one cylinder, in time order.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct CylinderSegments {
    pub cylinder_index: u32,
    pub segments: Vec<PressureSegment>,
}

impl CylinderSegments {
    pub fn total_pressure_time(&self) -> f64 {
        self.segments.iter().map(|s| s.pressure_time).sum()
    }
}

/// One raw sample as seen by the tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TrackedSample {
    pub cylinder: usize,
    pub sensor_mbar: Option<i32>,
    pub t_sec: i32,
    /// Weighted duration of the interval ending at this sample
    pub pressure_time: f64,
    /// False when the active cylinder differs from the previous sample's
    pub same_cylinder: bool,
}

#[derive(Debug)]
pub(crate) struct SegmentTracker {
    tracks: Vec<Vec<PressureSegment>>,
    recorded_end: Vec<Option<i32>>,
    used: Vec<bool>,
    previous: Option<TrackedSample>,
}

impl SegmentTracker {
    /// Start tracking with one open segment per cylinder carrying its
    /// recorded start pressure.
    pub fn new(cylinders: &[CylinderInput]) -> Self {
        Self {
            tracks: cylinders
                .iter()
                .map(|c| vec![PressureSegment::open(c.recorded_start(), 0, false)])
                .collect(),
            recorded_end: cylinders.iter().map(CylinderInput::recorded_end).collect(),
            used: vec![false; cylinders.len()],
            previous: None,
        }
    }

    /// Feed the next raw sample, in time order.
    ///
    /// Returns the index of the segment the sample belongs to within its
    /// cylinder's list.
    pub fn on_sample(&mut self, sample: TrackedSample) -> usize {
        match self.previous {
            Some(prev) if !sample.same_cylinder => {
                self.close_last(prev.cylinder, sample.t_sec, prev.sensor_mbar);
                self.activate(sample);
            }
            Some(prev) => match (prev.sensor_mbar, sample.sensor_mbar) {
                (None, Some(reading)) => {
                    // The resuming reading ends the gap, and the drop to
                    // it happened during this interval.
                    self.add_pressure_time(sample.cylinder, sample.pressure_time);
                    self.close_last(sample.cylinder, sample.t_sec, Some(reading));
                    self.push(sample.cylinder, Some(reading), sample.t_sec, true);
                    self.previous = Some(sample);
                    return self.current_index(sample.cylinder);
                }
                (Some(reading), None) => {
                    self.close_last(sample.cylinder, sample.t_sec, Some(reading));
                    self.push(sample.cylinder, None, sample.t_sec, false);
                }
                _ => {}
            },
            None => self.activate(sample),
        }
        self.add_pressure_time(sample.cylinder, sample.pressure_time);
        self.previous = Some(sample);
        self.current_index(sample.cylinder)
    }

    /// Close the active segment and apply recorded end pressures.
    pub fn finish(mut self) -> Vec<CylinderSegments> {
        if let Some(last) = self.previous {
            self.close_last(last.cylinder, last.t_sec, last.sensor_mbar);
        }
        for (cylinder, end) in self.recorded_end.iter().enumerate() {
            let (Some(end), true) = (end, self.used[cylinder]) else {
                continue;
            };
            if let Some(segment) = self.tracks[cylinder].last_mut() {
                if segment.end_mbar.is_none() {
                    segment.end_mbar = Some(*end);
                }
            }
        }
        self.tracks
            .into_iter()
            .enumerate()
            .map(|(i, segments)| CylinderSegments {
                cylinder_index: i as u32,
                segments,
            })
            .collect()
    }

    fn activate(&mut self, sample: TrackedSample) {
        let cylinder = sample.cylinder;
        if !self.used[cylinder] {
            // The first use adopts the initial segment.
            self.used[cylinder] = true;
            if let Some(segment) = self.current_mut(cylinder) {
                segment.start_sec = sample.t_sec;
                segment.sensor_reporting = sample.sensor_mbar.is_some();
                if sample.sensor_mbar.is_some() {
                    segment.start_mbar = sample.sensor_mbar;
                }
            }
            trace!(cylinder, t_sec = sample.t_sec, "first use of cylinder");
            return;
        }
        if let Some(reading) = sample.sensor_mbar {
            // Back on a cylinder whose last segment was a gap: this reading
            // is the pressure the gap ended at.
            if let Some(last) = self.current_mut(cylinder) {
                if !last.sensor_reporting && last.end_mbar.is_none() {
                    last.end_mbar = Some(reading);
                }
            }
        }
        self.push(
            cylinder,
            sample.sensor_mbar,
            sample.t_sec,
            sample.sensor_mbar.is_some(),
        );
    }

    fn push(&mut self, cylinder: usize, start: Option<i32>, t_sec: i32, reporting: bool) {
        trace!(cylinder, t_sec, reporting, "open pressure segment");
        self.tracks[cylinder].push(PressureSegment::open(start, t_sec, reporting));
    }

    fn close_last(&mut self, cylinder: usize, t_sec: i32, end: Option<i32>) {
        if let Some(segment) = self.current_mut(cylinder) {
            segment.end_sec = Some(t_sec);
            if segment.end_mbar.is_none() {
                segment.end_mbar = end;
            }
        }
        trace!(cylinder, t_sec, end_mbar = ?end, "close pressure segment");
    }

    fn add_pressure_time(&mut self, cylinder: usize, pressure_time: f64) {
        if let Some(segment) = self.current_mut(cylinder) {
            segment.pressure_time += pressure_time;
        }
    }

    // Every track starts with one segment and only grows.
    fn current_mut(&mut self, cylinder: usize) -> Option<&mut PressureSegment> {
        self.tracks.get_mut(cylinder)?.last_mut()
    }

    fn current_index(&self, cylinder: usize) -> usize {
        self.tracks
            .get(cylinder)
            .map_or(0, |track| track.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder(start_mbar: i32, end_mbar: i32) -> CylinderInput {
        CylinderInput {
            start_mbar,
            end_mbar,
            ..CylinderInput::default()
        }
    }

    /// Feed (cylinder, pressure, time, weight) tuples the way the series
    /// builder does.
    fn track(cylinders: &[CylinderInput], samples: &[(usize, i32, i32, f64)]) -> Vec<CylinderSegments> {
        let mut tracker = SegmentTracker::new(cylinders);
        let mut previous_cylinder = None;
        for &(cylinder, pressure, t_sec, pressure_time) in samples {
            tracker.on_sample(TrackedSample {
                cylinder,
                sensor_mbar: (pressure != 0).then_some(pressure),
                t_sec,
                pressure_time,
                same_cylinder: previous_cylinder == Some(cylinder),
            });
            previous_cylinder = Some(cylinder);
        }
        tracker.finish()
    }

    fn assert_ordered(segments: &[PressureSegment]) {
        for pair in segments.windows(2) {
            let end = pair[0].end_sec.expect("earlier segment must be closed");
            assert!(
                end <= pair[1].start_sec,
                "segments overlap: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_continuous_sensor_single_segment() {
        let tracks = track(
            &[cylinder(200000, 0)],
            &[(0, 200000, 0, 0.0), (0, 195000, 30, 60.0), (0, 190000, 60, 60.0)],
        );
        let segments = &tracks[0].segments;
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_mbar, Some(200000));
        assert_eq!(segments[0].end_mbar, Some(190000));
        assert_eq!(segments[0].start_sec, 0);
        assert_eq!(segments[0].end_sec, Some(60));
        assert!((segments[0].pressure_time - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_sensor_gap_deferred_until_resume() {
        let tracks = track(
            &[cylinder(200000, 0)],
            &[
                (0, 200000, 0, 0.0),
                (0, 190000, 30, 60.0),
                (0, 0, 60, 84.0),
                (0, 0, 90, 84.0),
                (0, 160000, 120, 30.0),
            ],
        );
        let segments = &tracks[0].segments;
        assert_eq!(segments.len(), 3);
        assert_ordered(segments);

        assert_eq!(segments[0].end_mbar, Some(190000));
        assert_eq!(segments[0].end_sec, Some(60));

        let gap = &segments[1];
        assert!(!gap.sensor_reporting);
        assert_eq!(gap.start_sec, 60);
        assert_eq!(gap.end_sec, Some(120));
        assert_eq!(gap.end_mbar, Some(160000));
        assert!((gap.pressure_time - 198.0).abs() < 1e-9);

        assert_eq!(segments[2].start_mbar, Some(160000));
        assert_eq!(segments[2].start_sec, 120);
        assert_eq!(segments[2].pressure_time, 0.0);
    }

    #[test]
    fn test_cylinder_switch_closes_old_segment() {
        let tracks = track(
            &[cylinder(200000, 0), cylinder(150000, 0)],
            &[
                (0, 200000, 0, 0.0),
                (0, 195000, 30, 30.0),
                (1, 150000, 60, 30.0),
                (1, 148000, 90, 30.0),
            ],
        );
        assert_eq!(tracks[0].segments.len(), 1);
        let old = &tracks[0].segments[0];
        assert_eq!(old.end_sec, Some(60));
        assert_eq!(old.end_mbar, Some(195000));

        assert_eq!(tracks[1].segments.len(), 1);
        let new = &tracks[1].segments[0];
        assert_eq!(new.start_sec, 60);
        assert_eq!(new.start_mbar, Some(150000));
        assert_eq!(new.end_sec, Some(90));
        assert_eq!(new.end_mbar, Some(148000));
    }

    #[test]
    fn test_unused_cylinder_stays_open() {
        let tracks = track(
            &[cylinder(200000, 100000), cylinder(180000, 170000)],
            &[(0, 0, 0, 0.0), (0, 0, 60, 60.0)],
        );
        let unused = &tracks[1].segments;
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].start_mbar, Some(180000));
        assert_eq!(unused[0].end_sec, None);
        assert!(!unused[0].is_resolved());
        assert_eq!(unused[0].pressure_time, 0.0);
    }

    #[test]
    fn test_recorded_end_resolves_trailing_gap() {
        let tracks = track(
            &[cylinder(200000, 100000)],
            &[(0, 0, 0, 0.0), (0, 0, 60, 60.0), (0, 0, 120, 60.0)],
        );
        let segments = &tracks[0].segments;
        assert_eq!(segments.len(), 1);
        // Recorded start carries over into the adopted segment.
        assert_eq!(segments[0].start_mbar, Some(200000));
        assert_eq!(segments[0].end_mbar, Some(100000));
        assert_eq!(segments[0].end_sec, Some(120));
    }

    #[test]
    fn test_switch_back_with_reading_resolves_gap() {
        let tracks = track(
            &[cylinder(200000, 0), cylinder(150000, 0)],
            &[
                (0, 0, 0, 0.0),
                (0, 0, 60, 60.0),
                (1, 150000, 120, 60.0),
                (0, 170000, 180, 60.0),
            ],
        );
        let segments = &tracks[0].segments;
        assert_eq!(segments.len(), 2);
        assert_ordered(segments);
        assert_eq!(segments[0].end_sec, Some(120));
        assert_eq!(segments[0].end_mbar, Some(170000));
        assert_eq!(segments[1].start_sec, 180);
    }

    #[test]
    fn test_reporting_to_gap_toggle() {
        let tracks = track(
            &[cylinder(0, 0)],
            &[(0, 200000, 0, 0.0), (0, 0, 30, 30.0), (0, 0, 60, 30.0)],
        );
        let segments = &tracks[0].segments;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end_mbar, Some(200000));
        assert_eq!(segments[0].end_sec, Some(30));
        assert!(!segments[1].sensor_reporting);
        assert_eq!(segments[1].end_mbar, None);
        assert_eq!(segments[1].end_sec, Some(60));
        assert!((segments[1].pressure_time - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_index_with_repeated_timestamps() {
        let mut tracker = SegmentTracker::new(&[cylinder(200000, 0)]);
        let mut indices = Vec::new();
        let samples = [
            (190000, 30),
            (0, 60),
            (180000, 60),
            (0, 90),
        ];
        for (i, &(pressure, t_sec)) in samples.iter().enumerate() {
            indices.push(tracker.on_sample(TrackedSample {
                cylinder: 0,
                sensor_mbar: (pressure != 0).then_some(pressure),
                t_sec,
                pressure_time: 30.0,
                same_cylinder: i > 0,
            }));
        }
        // The gap at 60s and the reading that ends it share a timestamp but
        // land in different segments.
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let segments = tracker.finish().remove(0).segments;
        assert_eq!(segments[1].start_sec, 60);
        assert_eq!(segments[1].end_sec, Some(60));
        assert_eq!(segments[1].end_mbar, Some(180000));
        assert_eq!(segments[2].start_sec, 60);
        assert!(segments[2].sensor_reporting);
    }
}
