use std::ops::Range;

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::error::{HResult, HalError};
use crate::sensor_type::{DataShape, SensorType};

/// Capacity of sample and event payload buffers
pub const SENSOR_DATA_MAX: usize = 16;

/// Slots of the accel+gyro fusion output inside `SensorBaseData::processed`
pub struct FusionLayout;

impl FusionLayout {
    /// Orientation quaternion (x, y, z, w)
    pub const QUATERNION: Range<usize> = 0..4;
    /// Gravity vector, m/s²
    pub const GRAVITY: Range<usize> = 4..7;
    /// Linear acceleration, m/s²
    pub const LINEAR_ACCELERATION: Range<usize> = 7..10;
}

/// Processed sample handed from a producer to its dependents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorBaseData {
    pub processed: [f32; SENSOR_DATA_MAX],
    /// Monotonic timestamp, ns
    pub timestamp: i64,
    /// Period the producer is running at, ns
    pub pollrate_ns: i64,
}

impl SensorBaseData {
    pub fn new(timestamp: i64, pollrate_ns: i64) -> Self {
        Self {
            processed: [0.0; SENSOR_DATA_MAX],
            timestamp,
            pollrate_ns,
        }
    }

    /// Build from a processed buffer of up to `SENSOR_DATA_MAX` values.
    /// Missing trailing values are zero.
    pub fn from_processed(values: &[f32], timestamp: i64, pollrate_ns: i64) -> HResult<Self> {
        if values.len() > SENSOR_DATA_MAX {
            return Err(HalError::InvalidParameters(format!(
                "processed buffer holds {} values, at most {} allowed",
                values.len(),
                SENSOR_DATA_MAX
            )));
        }

        let mut sample = Self::new(timestamp, pollrate_ns);
        sample.processed[..values.len()].copy_from_slice(values);
        Ok(sample)
    }

    pub fn with_quaternion(mut self, orientation: &UnitQuaternion<f32>) -> Self {
        let c = orientation.quaternion().coords;
        self.processed[FusionLayout::QUATERNION].copy_from_slice(&[c.x, c.y, c.z, c.w]);
        self
    }

    pub fn with_gravity(mut self, gravity: [f32; 3]) -> Self {
        self.processed[FusionLayout::GRAVITY].copy_from_slice(&gravity);
        self
    }

    pub fn with_linear_acceleration(mut self, accel: [f32; 3]) -> Self {
        self.processed[FusionLayout::LINEAR_ACCELERATION].copy_from_slice(&accel);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Data,
    /// Marks the end of a flush request for `sensor`
    FlushComplete,
}

/// Outgoing event written to the event pipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Handle of the producing sensor
    pub sensor: i32,
    pub sensor_type: i32,
    pub timestamp: i64,
    pub data: [f32; SENSOR_DATA_MAX],
    pub data_len: DataShape,
    pub kind: EventKind,
}

impl SensorEvent {
    pub fn new(sensor: i32, sensor_type: SensorType, data_len: DataShape) -> Self {
        Self {
            sensor,
            sensor_type: sensor_type.id(),
            timestamp: 0,
            data: [0.0; SENSOR_DATA_MAX],
            data_len,
            kind: EventKind::Data,
        }
    }

    pub fn flush_complete(sensor: i32, timestamp: i64) -> Self {
        Self {
            sensor,
            sensor_type: SensorType::MetaData.id(),
            timestamp,
            data: [0.0; SENSOR_DATA_MAX],
            data_len: DataShape::None,
            kind: EventKind::FlushComplete,
        }
    }

    /// Payload values, exactly `data_len` of them
    pub fn values(&self) -> &[f32] {
        &self.data[..self.data_len.len()]
    }

    /// Writable payload slot sized to the declared shape
    pub fn payload_mut(&mut self) -> &mut [f32] {
        let len = self.data_len.len();
        &mut self.data[..len]
    }

    pub fn is_flush_complete(&self) -> bool {
        self.kind == EventKind::FlushComplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_from_processed_pads_with_zero() {
        let sample = SensorBaseData::from_processed(&[1.0, 2.0], 10, 20).unwrap();
        assert_eq!(&sample.processed[..3], &[1.0, 2.0, 0.0]);
        assert_eq!(sample.timestamp, 10);
        assert_eq!(sample.pollrate_ns, 20);
    }

    #[test]
    fn test_from_processed_rejects_oversized() {
        let values = [0.0f32; SENSOR_DATA_MAX + 1];
        assert!(matches!(
            SensorBaseData::from_processed(&values, 0, 0),
            Err(HalError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_quaternion_layout_is_xyzw() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2);
        let sample = SensorBaseData::new(0, 0).with_quaternion(&q);

        let half = std::f32::consts::FRAC_PI_4;
        assert_relative_eq!(sample.processed[0], 0.0);
        assert_relative_eq!(sample.processed[1], 0.0);
        assert_relative_eq!(sample.processed[2], half.sin(), epsilon = 1e-6);
        assert_relative_eq!(sample.processed[3], half.cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_fusion_slots_do_not_overlap() {
        let sample = SensorBaseData::new(0, 0)
            .with_gravity([1.0, 2.0, 3.0])
            .with_linear_acceleration([4.0, 5.0, 6.0]);
        assert_eq!(&sample.processed[FusionLayout::QUATERNION], &[0.0; 4]);
        assert_eq!(&sample.processed[FusionLayout::GRAVITY], &[1.0, 2.0, 3.0]);
        assert_eq!(&sample.processed[FusionLayout::LINEAR_ACCELERATION], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_event_payload_matches_shape() {
        let mut event = SensorEvent::new(1, SensorType::GameRotationVector, DataShape::Axis4);
        assert_eq!(event.payload_mut().len(), 4);
        event.payload_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(event.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(event.sensor_type, 15);
    }

    #[test]
    fn test_flush_event() {
        let event = SensorEvent::flush_complete(9, 123);
        assert!(event.is_flush_complete());
        assert_eq!(event.sensor, 9);
        assert_eq!(event.sensor_type, SensorType::MetaData.id());
        assert!(event.values().is_empty());
    }
}
