use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::SensorDescriptor;
use crate::error::{HResult, HalError};
use crate::sensor_type::SensorType;

/// Software sensors that can be listed in the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwSensorKind {
    GameRotationVector,
    Gravity,
    LinearAcceleration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwSensorEntry {
    pub name: String,
    pub handle: i32,
    pub kind: SwSensorKind,
}

impl SwSensorEntry {
    pub fn new(name: &str, handle: i32, kind: SwSensorKind) -> Self {
        Self {
            name: name.to_string(),
            handle,
            kind,
        }
    }
}

/// Descriptor of the external accel+gyro fusion provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub name: String,
    pub handle: i32,
    pub max_range: f32,
    pub resolution: f32,
    pub power_ma: f32,
    pub min_delay_us: i32,
    pub max_delay_us: i32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            name: "Accel-Gyro Fusion 6X".to_string(),
            handle: 100,
            max_range: 78.4,
            resolution: 1.0e-4,
            power_ma: 0.5,
            min_delay_us: 2_500,
            max_delay_us: 1_000_000,
        }
    }
}

impl FusionConfig {
    pub fn descriptor(&self, vendor: &str) -> SensorDescriptor {
        SensorDescriptor::new(&self.name, self.handle, SensorType::AccelGyroFusion6X)
            .with_vendor(vendor)
            .with_max_range(self.max_range)
            .with_resolution(self.resolution)
            .with_power(self.power_ma)
            .with_delay_range(self.min_delay_us, self.max_delay_us)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalConfig {
    pub vendor: String,
    /// Events the pipe holds before writers start dropping
    pub pipe_capacity: usize,
    /// Samples thrown away after each enable while the fusion settles
    pub samples_to_discard: u32,
    /// Period applied when a sensor is enabled without a prior set_delay
    pub default_pollrate_ns: i64,
    pub fusion: FusionConfig,
    pub sensors: Vec<SwSensorEntry>,
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            vendor: "Software Sensors".to_string(),
            pipe_capacity: 256,
            samples_to_discard: 0,
            default_pollrate_ns: 200_000_000,
            fusion: FusionConfig::default(),
            sensors: vec![
                SwSensorEntry::new("Game Rotation Vector", 1, SwSensorKind::GameRotationVector),
                SwSensorEntry::new("Gravity", 2, SwSensorKind::Gravity),
                SwSensorEntry::new("Linear Acceleration", 3, SwSensorKind::LinearAcceleration),
            ],
        }
    }
}

impl HalConfig {
    pub fn from_json_str(json: &str) -> HResult<Self> {
        let config: HalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> HResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| HalError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> HResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> HResult<()> {
        if self.pipe_capacity == 0 {
            return Err(HalError::Config("pipe_capacity must be positive".to_string()));
        }
        if self.default_pollrate_ns <= 0 {
            return Err(HalError::Config(
                "default_pollrate_ns must be positive".to_string(),
            ));
        }

        let mut handles = HashSet::new();
        handles.insert(self.fusion.handle);
        for entry in &self.sensors {
            if !handles.insert(entry.handle) {
                return Err(HalError::Config(format!(
                    "handle {} used more than once",
                    entry.handle
                )));
            }
        }

        Ok(())
    }
}
