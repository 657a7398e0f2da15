use serde::{Deserialize, Serialize};

/// First id available for vendor-private sensor types
pub const SENSOR_TYPE_DEVICE_PRIVATE_BASE: i32 = 0x10000;

/// Sensor types handled by the software layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    MetaData,
    Accelerometer,
    MagneticField,
    Gyroscope,
    Gravity,
    LinearAcceleration,
    RotationVector,
    GameRotationVector,
    GeomagneticRotationVector,
    /// Accelerometer + gyroscope fusion, feeds the game rotation vector
    AccelGyroFusion6X,
    /// Accelerometer + magnetometer fusion
    AccelMagnFusion6X,
    /// Accelerometer + magnetometer + gyroscope fusion
    AccelMagnGyroFusion9X,
}

impl SensorType {
    pub const fn id(self) -> i32 {
        match self {
            SensorType::MetaData => 0,
            SensorType::Accelerometer => 1,
            SensorType::MagneticField => 2,
            SensorType::Gyroscope => 4,
            SensorType::Gravity => 9,
            SensorType::LinearAcceleration => 10,
            SensorType::RotationVector => 11,
            SensorType::GameRotationVector => 15,
            SensorType::GeomagneticRotationVector => 20,
            SensorType::AccelGyroFusion6X => SENSOR_TYPE_DEVICE_PRIVATE_BASE + 1,
            SensorType::AccelMagnFusion6X => SENSOR_TYPE_DEVICE_PRIVATE_BASE + 2,
            SensorType::AccelMagnGyroFusion9X => SENSOR_TYPE_DEVICE_PRIVATE_BASE + 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        const ALL: [SensorType; 12] = [
            SensorType::MetaData,
            SensorType::Accelerometer,
            SensorType::MagneticField,
            SensorType::Gyroscope,
            SensorType::Gravity,
            SensorType::LinearAcceleration,
            SensorType::RotationVector,
            SensorType::GameRotationVector,
            SensorType::GeomagneticRotationVector,
            SensorType::AccelGyroFusion6X,
            SensorType::AccelMagnFusion6X,
            SensorType::AccelMagnGyroFusion9X,
        ];
        ALL.into_iter().find(|t| t.id() == id)
    }

    pub const fn is_private(self) -> bool {
        self.id() >= SENSOR_TYPE_DEVICE_PRIVATE_BASE
    }

    /// Framework string type, e.g. `android.sensor.game_rotation_vector`
    pub const fn string_type(self) -> &'static str {
        match self {
            SensorType::MetaData => "android.sensor.meta_data",
            SensorType::Accelerometer => "android.sensor.accelerometer",
            SensorType::MagneticField => "android.sensor.magnetic_field",
            SensorType::Gyroscope => "android.sensor.gyroscope",
            SensorType::Gravity => "android.sensor.gravity",
            SensorType::LinearAcceleration => "android.sensor.linear_acceleration",
            SensorType::RotationVector => "android.sensor.rotation_vector",
            SensorType::GameRotationVector => "android.sensor.game_rotation_vector",
            SensorType::GeomagneticRotationVector => {
                "android.sensor.geomagnetic_rotation_vector"
            }
            SensorType::AccelGyroFusion6X => "swsensor.accel_gyro_fusion_6x",
            SensorType::AccelMagnFusion6X => "swsensor.accel_magn_fusion_6x",
            SensorType::AccelMagnGyroFusion9X => "swsensor.accel_magn_gyro_fusion_9x",
        }
    }
}

/// Number of payload values an event of a given shape carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataShape {
    None,
    Axis1,
    Axis3,
    /// Three values followed by an accuracy estimate
    Axis3Accuracy,
    Axis4,
    /// Four values followed by an accuracy estimate
    Axis4Accuracy,
}

impl DataShape {
    pub const fn len(self) -> usize {
        match self {
            DataShape::None => 0,
            DataShape::Axis1 => 1,
            DataShape::Axis3 => 3,
            DataShape::Axis3Accuracy | DataShape::Axis4 => 4,
            DataShape::Axis4Accuracy => 5,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_type_ids() {
        assert_eq!(SensorType::GameRotationVector.id(), 15);
        assert_eq!(SensorType::Gravity.id(), 9);
        assert_eq!(SensorType::LinearAcceleration.id(), 10);
        assert!(!SensorType::GameRotationVector.is_private());
        assert!(SensorType::AccelGyroFusion6X.is_private());
    }

    #[test]
    fn test_from_id() {
        assert_eq!(SensorType::from_id(15), Some(SensorType::GameRotationVector));
        assert_eq!(
            SensorType::from_id(SENSOR_TYPE_DEVICE_PRIVATE_BASE + 1),
            Some(SensorType::AccelGyroFusion6X)
        );
        assert_eq!(SensorType::from_id(3), None);
    }

    #[test]
    fn test_shape_lengths() {
        assert_eq!(DataShape::Axis4.len(), 4);
        assert_eq!(DataShape::Axis3Accuracy.len(), 4);
        assert_eq!(DataShape::Axis4Accuracy.len(), 5);
        assert!(DataShape::None.is_empty());
    }
}
