//! Input records supplied by the sample source.
//!
//! Units follow the dive computer: seconds, millimetres, millibar and
//! millikelvin. A zero pressure or temperature means "not recorded".

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct RawSample {
    /// Time offset from dive start in seconds
    pub t_sec: i32,
    pub depth_mm: i32,
    /// Water temperature, 0 if unknown
    pub temperature_mk: i32,
    /// Index into `DiveInput::cylinders` of the cylinder being breathed
    pub cylinder_index: u32,
    /// Sensor pressure of the active cylinder, 0 if unavailable
    pub pressure_mbar: i32,
}

impl RawSample {
    pub fn sensor_pressure(&self) -> Option<i32> {
        known(self.pressure_mbar)
    }

    pub fn temperature(&self) -> Option<i32> {
        known(self.temperature_mk)
    }
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct CylinderInput {
    /// "AL80", "HP100" or whatever the user typed
    pub description: Option<String>,
    /// Water capacity in millilitres, 0 if unknown
    pub size_ml: i32,
    pub working_pressure_mbar: i32,
    /// Start pressure recorded by the device or the user, 0 if unknown
    pub start_mbar: i32,
    /// End pressure recorded by the device or the user, 0 if unknown
    pub end_mbar: i32,
}

impl CylinderInput {
    pub fn recorded_start(&self) -> Option<i32> {
        known(self.start_mbar)
    }

    pub fn recorded_end(&self) -> Option<i32> {
        known(self.end_mbar)
    }
}

#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct DiveInput {
    pub max_depth_mm: i32,
    /// Mean depth as recorded for the dive; copied, never recomputed
    pub mean_depth_mm: i32,
    pub cylinders: Vec<CylinderInput>,
    /// Time-ordered raw samples
    pub samples: Vec<RawSample>,
}

fn known(value: i32) -> Option<i32> {
    (value != 0).then_some(value)
}
