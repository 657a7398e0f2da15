//! Three-axis leaves of the accel+gyro fusion output.

use std::sync::Arc;

use crate::base::SensorCore;
use crate::clock::Clock;
use crate::descriptor::FUSION_LEAF_INHERITANCE;
use crate::node::SensorNode;
use crate::sample::{FusionLayout, SensorBaseData};
use crate::sensor_type::{DataShape, SensorType};

/// Standard gravity, m/s²
pub const GRAVITY_EARTH: f32 = 9.806_65;

fn three_axis_core(
    name: &str,
    handle: i32,
    sensor_type: SensorType,
    clock: Arc<dyn Clock>,
) -> SensorCore {
    let mut core = SensorCore::new(
        name,
        handle,
        sensor_type,
        FUSION_LEAF_INHERITANCE,
        DataShape::Axis3,
        clock,
    );
    core.descriptor_mut().max_range = 2.0 * GRAVITY_EARTH;

    let slot = core.add_dependency(SensorType::AccelGyroFusion6X);
    core.set_trigger(slot);
    core
}

/// Gravity vector separated out by the fusion filter
pub struct SwGravity {
    core: SensorCore,
}

impl SwGravity {
    pub fn new(name: &str, handle: i32, clock: Arc<dyn Clock>) -> Self {
        Self {
            core: three_axis_core(name, handle, SensorType::Gravity, clock),
        }
    }
}

impl SensorNode for SwGravity {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn process_data(&mut self, sample: &SensorBaseData) {
        let event = self.core.event_mut();
        event
            .payload_mut()
            .copy_from_slice(&sample.processed[FusionLayout::GRAVITY]);
        event.timestamp = sample.timestamp;

        self.core.write_data_to_pipe(sample.pollrate_ns);
        self.core.process_data(sample);
    }
}

/// Acceleration with gravity removed
pub struct SwLinearAcceleration {
    core: SensorCore,
}

impl SwLinearAcceleration {
    pub fn new(name: &str, handle: i32, clock: Arc<dyn Clock>) -> Self {
        Self {
            core: three_axis_core(name, handle, SensorType::LinearAcceleration, clock),
        }
    }
}

impl SensorNode for SwLinearAcceleration {
    fn core(&self) -> &SensorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SensorCore {
        &mut self.core
    }

    fn process_data(&mut self, sample: &SensorBaseData) {
        let event = self.core.event_mut();
        event
            .payload_mut()
            .copy_from_slice(&sample.processed[FusionLayout::LINEAR_ACCELERATION]);
        event.timestamp = sample.timestamp;

        self.core.write_data_to_pipe(sample.pollrate_ns);
        self.core.process_data(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn fusion_sample() -> SensorBaseData {
        SensorBaseData::new(500, 10_000_000)
            .with_gravity([0.0, 0.0, GRAVITY_EARTH])
            .with_linear_acceleration([0.5, -0.25, 0.0])
    }

    #[test]
    fn test_gravity_copies_gravity_slot() {
        let mut node = SwGravity::new("gravity", 2, Arc::new(ManualClock::new(0)));
        node.process_data(&fusion_sample());

        assert_eq!(node.event().values(), &[0.0, 0.0, GRAVITY_EARTH]);
        assert_eq!(node.event().timestamp, 500);
        assert_eq!(node.sensor_type(), SensorType::Gravity);
        assert_eq!(node.trigger_type(), Some(SensorType::AccelGyroFusion6X));
    }

    #[test]
    fn test_linear_acceleration_copies_linear_slot() {
        let mut node = SwLinearAcceleration::new("linear", 3, Arc::new(ManualClock::new(0)));
        node.process_data(&fusion_sample());

        assert_eq!(node.event().values(), &[0.5, -0.25, 0.0]);
        assert_eq!(node.event().data_len, DataShape::Axis3);
        assert_eq!(node.core().stats().last_pipe_period_ns, Some(10_000_000));
    }
}
