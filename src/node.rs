use crate::base::SensorCore;
use crate::descriptor::SensorDescriptor;
use crate::sample::{SensorBaseData, SensorEvent};
use crate::sensor_type::SensorType;

/// A software sensor that turns samples from its trigger dependency into its
/// own events.
///
/// Implementors own a [`SensorCore`] and only provide the transform; the
/// provided methods expose the core's declaration and state.
pub trait SensorNode: Send {
    fn core(&self) -> &SensorCore;

    fn core_mut(&mut self) -> &mut SensorCore;

    /// Run one transform cycle on a sample from the trigger dependency.
    fn process_data(&mut self, sample: &SensorBaseData);

    fn handle(&self) -> i32 {
        self.core().descriptor().handle
    }

    fn sensor_type(&self) -> SensorType {
        self.core().descriptor().sensor_type
    }

    fn descriptor(&self) -> &SensorDescriptor {
        self.core().descriptor()
    }

    fn dependencies(&self) -> &[SensorType] {
        self.core().dependencies()
    }

    fn trigger_index(&self) -> Option<usize> {
        self.core().trigger_index()
    }

    fn trigger_type(&self) -> Option<SensorType> {
        self.core().trigger_type()
    }

    fn event(&self) -> &SensorEvent {
        self.core().event()
    }
}
