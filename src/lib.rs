// Software sensor layer of an Android sensor HAL
// Derives game rotation vector, gravity and linear acceleration events from an
// external accel+gyro fusion provider and delivers them through a shared pipe

pub mod android_jni;
pub mod base;
pub mod clock;
pub mod config;
pub mod derived;
pub mod descriptor;
pub mod error;
pub mod game_rotation;
pub mod hub;
pub mod node;
pub mod pipe;
pub mod sample;
pub mod sensor_type;

pub use base::{NodeStats, SensorCore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{HalConfig, SwSensorEntry, SwSensorKind};
pub use derived::{SwGravity, SwLinearAcceleration};
pub use descriptor::{DependencyInheritance, SensorDescriptor};
pub use error::{HResult, HalError};
pub use game_rotation::SwGameRotationVector;
pub use hub::SensorHub;
pub use node::SensorNode;
pub use pipe::{EventPipe, PipeReader, PipeWriter};
pub use sample::{FusionLayout, SensorBaseData, SensorEvent, SENSOR_DATA_MAX};
pub use sensor_type::{DataShape, SensorType};

/// Install the platform log backend: logcat on Android, `env_logger`
/// elsewhere. Safe to call more than once.
pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        let _ = android_log::init("SWSensorHAL");
    }

    #[cfg(not(target_os = "android"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
