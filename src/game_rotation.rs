use std::sync::Arc;

use crate::base::SensorCore;
use crate::clock::Clock;
use crate::descriptor::FUSION_LEAF_INHERITANCE;
use crate::node::SensorNode;
use crate::sample::{FusionLayout, SensorBaseData};
use crate::sensor_type::{DataShape, SensorType};

/// Game rotation vector: the orientation quaternion of the accel+gyro fusion,
/// without magnetometer heading.
pub struct SwGameRotationVector {
    core: SensorCore,
}

impl SwGameRotationVector {
    pub fn new(name: &str, handle: i32, clock: Arc<dyn Clock>) -> Self {
        let mut core = SensorCore::new(
            name,
            handle,
            SensorType::GameRotationVector,
            FUSION_LEAF_INHERITANCE,
            DataShape::Axis4,
            clock,
        );
        core.descriptor_mut().max_range = 1.0;

        let slot = core.add_dependency(SensorType::AccelGyroFusion6X);
        core.set_trigger(slot);

        Self { core }
    }
}

impl SensorNode for SwGameRotationVector {
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
            .copy_from_slice(&sample.processed[FusionLayout::QUATERNION]);
        event.timestamp = sample.timestamp;

        self.core.write_data_to_pipe(sample.pollrate_ns);
        self.core.process_data(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pipe::EventPipe;
    use crate::sample::SENSOR_DATA_MAX;

    fn node() -> SwGameRotationVector {
        SwGameRotationVector::new("game-rv", 42, Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn test_construction_declares_fusion_trigger() {
        let node = node();
        assert_eq!(node.dependencies(), &[SensorType::AccelGyroFusion6X]);
        assert_eq!(node.trigger_index(), Some(0));
        assert_eq!(node.trigger_type(), Some(SensorType::AccelGyroFusion6X));
        assert_eq!(node.handle(), 42);
        assert_eq!(node.sensor_type(), SensorType::GameRotationVector);
    }

    #[test]
    fn test_event_shape_preset() {
        let node = node();
        assert_eq!(node.event().data_len, DataShape::Axis4);
        assert_eq!(node.event().values().len(), 4);
        assert_eq!(node.descriptor().max_range, 1.0);
    }

    #[test]
    fn test_process_data_scenario() {
        let pipe = EventPipe::bounded(4);
        let mut node = node();

        let mut processed = [0.0f32; SENSOR_DATA_MAX];
        processed[..6].copy_from_slice(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        let sample = SensorBaseData {
            processed,
            timestamp: 1000,
            pollrate_ns: 20_000_000,
        };

        node.core_mut().attach_pipe(pipe.writer());
        node.core_mut().set_enable(true);
        node.process_data(&sample);

        assert_eq!(node.event().values(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(node.event().timestamp, 1000);
        assert_eq!(node.core().stats().last_pipe_period_ns, Some(20_000_000));
        assert_eq!(node.core().stats().processed, 1);

        let delivered = pipe.reader().poll(4);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].values(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(delivered[0].sensor, 42);
    }

    #[test]
    fn test_copy_is_bit_exact() {
        let mut node = node();
        let values = [f32::MIN_POSITIVE, -0.0, f32::MAX, 1.0e-40];
        let sample = SensorBaseData::from_processed(&values, i64::MAX, 1).unwrap();

        node.process_data(&sample);

        let out = node.event().values();
        for (a, b) in out.iter().zip(values.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(node.event().timestamp, i64::MAX);
    }

    #[test]
    fn test_each_cycle_overwrites_event() {
        let mut node = node();
        node.process_data(&SensorBaseData::from_processed(&[1.0, 1.0, 1.0, 1.0], 1, 1).unwrap());
        node.process_data(&SensorBaseData::from_processed(&[2.0, 3.0, 4.0, 5.0, 9.0], 2, 1).unwrap());

        assert_eq!(node.event().values(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(node.event().timestamp, 2);
        assert_eq!(node.event().data[4], 0.0);
    }
}
