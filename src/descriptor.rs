use serde::{Deserialize, Serialize};

use crate::sensor_type::SensorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingMode {
    Continuous,
    OnChange,
    OneShot,
    SpecialTrigger,
}

/// Static description of a sensor as reported in the sensor list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub name: String,
    pub vendor: String,
    pub version: i32,
    pub handle: i32,
    pub sensor_type: SensorType,
    pub string_type: String,
    pub max_range: f32,
    pub resolution: f32,
    /// Current draw, mA
    pub power_ma: f32,
    /// Fastest supported period, µs
    pub min_delay_us: i32,
    /// Slowest supported period, µs; 0 means no limit
    pub max_delay_us: i32,
    pub fifo_reserved_event_count: u32,
    pub fifo_max_event_count: u32,
    pub wake_up: bool,
    pub reporting_mode: ReportingMode,
}

impl SensorDescriptor {
    pub fn new(name: &str, handle: i32, sensor_type: SensorType) -> Self {
        Self {
            name: name.to_string(),
            vendor: String::new(),
            version: 1,
            handle,
            sensor_type,
            string_type: sensor_type.string_type().to_string(),
            max_range: 0.0,
            resolution: 0.0,
            power_ma: 0.0,
            min_delay_us: 0,
            max_delay_us: 0,
            fifo_reserved_event_count: 0,
            fifo_max_event_count: 0,
            wake_up: false,
            reporting_mode: ReportingMode::Continuous,
        }
    }

    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendor = vendor.to_string();
        self
    }

    pub fn with_max_range(mut self, max_range: f32) -> Self {
        self.max_range = max_range;
        self
    }

    pub fn with_resolution(mut self, resolution: f32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_power(mut self, power_ma: f32) -> Self {
        self.power_ma = power_ma;
        self
    }

    pub fn with_delay_range(mut self, min_delay_us: i32, max_delay_us: i32) -> Self {
        self.min_delay_us = min_delay_us;
        self.max_delay_us = max_delay_us;
        self
    }

    /// Clamp a requested period to `[min_delay, max_delay]`, in ns.
    pub fn clamp_period_ns(&self, period_ns: i64) -> i64 {
        let min_ns = i64::from(self.min_delay_us) * 1_000;
        let mut period = period_ns.max(min_ns);
        if self.max_delay_us > 0 {
            period = period.min(i64::from(self.max_delay_us) * 1_000);
        }
        period
    }

    /// Copy the fields selected by `flags` from the dependency that drives
    /// this sensor. Power always accumulates.
    pub fn inherit_from(&mut self, dependency: &SensorDescriptor, flags: DependencyInheritance) {
        if flags.resolution {
            self.resolution = dependency.resolution;
        }
        if flags.range {
            self.max_range = dependency.max_range;
        }
        if flags.delay {
            self.min_delay_us = dependency.min_delay_us;
            self.max_delay_us = dependency.max_delay_us;
        }
        if flags.name {
            self.name = dependency.name.clone();
        }
        self.power_ma += dependency.power_ma;
    }
}

/// Which descriptor fields a software sensor takes over from its trigger
/// dependency once that dependency is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyInheritance {
    pub resolution: bool,
    pub range: bool,
    pub delay: bool,
    pub name: bool,
}

impl DependencyInheritance {
    pub const fn new(resolution: bool, range: bool, delay: bool, name: bool) -> Self {
        Self {
            resolution,
            range,
            delay,
            name,
        }
    }
}

/// Leaves of a fusion sensor take resolution and delay limits from it but keep
/// their own range and name.
pub const FUSION_LEAF_INHERITANCE: DependencyInheritance =
    DependencyInheritance::new(true, false, true, false);
