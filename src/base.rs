//! Shared base pipeline owned by every software sensor node.
//!
//! A node fills its event, then calls [`SensorCore::write_data_to_pipe`] with
//! the producer's period and [`SensorCore::process_data`] with the sample it
//! consumed. Everything else here is control-plane state: enable, requested
//! period, flush and the dependency declaration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::descriptor::{DependencyInheritance, SensorDescriptor};
use crate::error::{HResult, HalError};
use crate::pipe::{GateDecision, PipeWriter, PollrateGate};
use crate::sample::{SensorBaseData, SensorEvent};
use crate::sensor_type::{DataShape, SensorType};

/// Per-node delivery counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub processed: u64,
    pub pipe_requests: u64,
    pub delivered: u64,
    pub decimated: u64,
    pub dropped: u64,
    /// Period passed with the most recent pipe write request
    pub last_pipe_period_ns: Option<i64>,
}

pub struct SensorCore {
    descriptor: SensorDescriptor,
    inheritance: DependencyInheritance,
    dependencies: Vec<SensorType>,
    trigger: Option<usize>,
    event: SensorEvent,
    gate: PollrateGate,
    pipe: Option<PipeWriter>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    enabled_at: i64,
    discard_on_enable: u32,
    discard_remaining: u32,
    output: Option<SensorBaseData>,
    stats: NodeStats,
}

impl SensorCore {
    pub fn new(
        name: &str,
        handle: i32,
        sensor_type: SensorType,
        inheritance: DependencyInheritance,
        shape: DataShape,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            descriptor: SensorDescriptor::new(name, handle, sensor_type),
            inheritance,
            dependencies: Vec::new(),
            trigger: None,
            event: SensorEvent::new(handle, sensor_type, shape),
            gate: PollrateGate::new(),
            pipe: None,
            clock,
            enabled: false,
            enabled_at: 0,
            discard_on_enable: 0,
            discard_remaining: 0,
            output: None,
            stats: NodeStats::default(),
        }
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn descriptor_mut(&mut self) -> &mut SensorDescriptor {
        &mut self.descriptor
    }

    pub fn inheritance(&self) -> DependencyInheritance {
        self.inheritance
    }

    /// Declare an upstream dependency, returns its slot
    pub fn add_dependency(&mut self, sensor_type: SensorType) -> usize {
        self.dependencies.push(sensor_type);
        self.dependencies.len() - 1
    }

    /// Mark which dependency slot triggers processing
    pub fn set_trigger(&mut self, index: usize) {
        debug_assert!(index < self.dependencies.len());
        self.trigger = Some(index);
    }

    pub fn dependencies(&self) -> &[SensorType] {
        &self.dependencies
    }

    pub fn trigger_index(&self) -> Option<usize> {
        self.trigger
    }

    pub fn trigger_type(&self) -> Option<SensorType> {
        self.trigger.and_then(|i| self.dependencies.get(i).copied())
    }

    pub fn event(&self) -> &SensorEvent {
        &self.event
    }

    pub fn event_mut(&mut self) -> &mut SensorEvent {
        &mut self.event
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn requested_pollrate_ns(&self) -> i64 {
        self.gate.requested_ns()
    }

    /// Cached output of the last cycle, forwarded to dependents
    pub fn output(&self) -> Option<&SensorBaseData> {
        self.output.as_ref()
    }

    pub fn attach_pipe(&mut self, pipe: PipeWriter) {
        self.pipe = Some(pipe);
    }

    /// Number of samples thrown away after each enable
    pub fn set_discard_on_enable(&mut self, samples: u32) {
        self.discard_on_enable = samples;
    }

    /// Apply the trigger dependency's descriptor to ours
    pub fn resolve_dependency(&mut self, dependency: &SensorDescriptor) {
        self.descriptor.inherit_from(dependency, self.inheritance);
        log::debug!(
            "{} (handle {}) resolved against {}",
            self.descriptor.name,
            self.descriptor.handle,
            dependency.name
        );
    }

    pub fn set_enable(&mut self, enable: bool) {
        if enable == self.enabled {
            return;
        }

        self.enabled = enable;
        self.gate.reset();
        if enable {
            self.enabled_at = self.clock.now_ns();
            self.discard_remaining = self.discard_on_enable;
        } else {
            self.output = None;
        }

        log::debug!(
            "{} (handle {}) {}",
            self.descriptor.name,
            self.descriptor.handle,
            if enable { "enabled" } else { "disabled" }
        );
    }

    /// Set the consumer's requested period, returns the effective one
    pub fn set_delay(&mut self, period_ns: i64) -> HResult<i64> {
        if period_ns <= 0 {
            return Err(HalError::InvalidPollrate(period_ns));
        }

        let effective = self.descriptor.clamp_period_ns(period_ns);
        self.gate.set_requested(effective);
        log::debug!(
            "{} (handle {}) period {} ns",
            self.descriptor.name,
            self.descriptor.handle,
            effective
        );
        Ok(effective)
    }

    /// Queue a flush-complete marker behind any pending events
    pub fn flush(&mut self) -> HResult<()> {
        if !self.enabled {
            return Err(HalError::NotEnabled(self.descriptor.handle));
        }
        let pipe = self.pipe.as_ref().ok_or(HalError::PipeClosed)?;

        let marker = SensorEvent::flush_complete(self.descriptor.handle, self.clock.now_ns());
        pipe.write(marker)
    }

    /// Offer the current event to the pipe, gated by the producer period
    pub fn write_data_to_pipe(&mut self, hw_pollrate_ns: i64) {
        self.stats.pipe_requests += 1;
        self.stats.last_pipe_period_ns = Some(hw_pollrate_ns);

        if !self.enabled || self.event.timestamp < self.enabled_at {
            self.stats.dropped += 1;
            return;
        }
        if self.discard_remaining > 0 {
            self.discard_remaining -= 1;
            self.stats.dropped += 1;
            return;
        }

        match self.gate.admit(self.event.timestamp, hw_pollrate_ns) {
            GateDecision::Deliver => {}
            GateDecision::Decimated => {
                self.stats.decimated += 1;
                return;
            }
            GateDecision::Stale => {
                log::trace!(
                    "{}: stale event at {} ns",
                    self.descriptor.name,
                    self.event.timestamp
                );
                self.stats.dropped += 1;
                return;
            }
        }

        let Some(pipe) = self.pipe.as_ref() else {
            self.stats.dropped += 1;
            return;
        };

        match pipe.write(self.event) {
            Ok(()) => self.stats.delivered += 1,
            Err(HalError::PipeFull) => {
                self.stats.dropped += 1;
                log::warn!("{}: event pipe full, event dropped", self.descriptor.name);
            }
            Err(e) => {
                self.stats.dropped += 1;
                log::error!("{}: {}", self.descriptor.name, e);
            }
        }
    }

    /// Generic continuation after a node produced its event
    pub fn process_data(&mut self, sample: &SensorBaseData) {
        self.stats.processed += 1;

        let mut output = SensorBaseData::new(self.event.timestamp, sample.pollrate_ns);
        let values = self.event.values();
        output.processed[..values.len()].copy_from_slice(values);
        self.output = Some(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pipe::EventPipe;

    fn core(clock: Arc<ManualClock>) -> SensorCore {
        let mut core = SensorCore::new(
            "test",
            5,
            SensorType::Gravity,
            DependencyInheritance::default(),
            DataShape::Axis3,
            clock,
        );
        let slot = core.add_dependency(SensorType::AccelGyroFusion6X);
        core.set_trigger(slot);
        core
    }

    fn emit(core: &mut SensorCore, timestamp: i64, hw_pollrate_ns: i64) {
        core.event_mut().timestamp = timestamp;
        core.write_data_to_pipe(hw_pollrate_ns);
    }

    #[test]
    fn test_disabled_core_delivers_nothing() {
        let pipe = EventPipe::bounded(8);
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.attach_pipe(pipe.writer());

        emit(&mut core, 10, 1_000);

        assert!(pipe.reader().is_empty());
        assert_eq!(core.stats().pipe_requests, 1);
        assert_eq!(core.stats().dropped, 1);
        assert_eq!(core.stats().last_pipe_period_ns, Some(1_000));
    }

    #[test]
    fn test_enabled_core_delivers() {
        let pipe = EventPipe::bounded(8);
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.attach_pipe(pipe.writer());
        core.set_enable(true);

        emit(&mut core, 10, 1_000);
        emit(&mut core, 20, 1_000);

        let events = pipe.reader().poll(8);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sensor, 5);
        assert_eq!(core.stats().delivered, 2);
    }

    #[test]
    fn test_events_before_enable_are_dropped() {
        let pipe = EventPipe::bounded(8);
        let clock = Arc::new(ManualClock::new(500));
        let mut core = core(clock);
        core.attach_pipe(pipe.writer());
        core.set_enable(true);

        emit(&mut core, 400, 1_000);
        emit(&mut core, 600, 1_000);

        let events = pipe.reader().poll(8);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 600);
    }

    #[test]
    fn test_discard_after_enable() {
        let pipe = EventPipe::bounded(8);
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.attach_pipe(pipe.writer());
        core.set_discard_on_enable(2);
        core.set_enable(true);

        for ts in 1..=4 {
            emit(&mut core, ts, 1_000);
        }

        let events = pipe.reader().poll(8);
        assert_eq!(events.iter().map(|e| e.timestamp).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_set_delay_decimates() {
        let pipe = EventPipe::bounded(16);
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.attach_pipe(pipe.writer());
        core.set_enable(true);
        assert_eq!(core.set_delay(20_000_000).unwrap(), 20_000_000);

        for i in 1..=8 {
            emit(&mut core, i * 5_000_000, 5_000_000);
        }

        assert_eq!(pipe.reader().poll(16).len(), 2);
        assert_eq!(core.stats().decimated, 6);
    }

    #[test]
    fn test_set_delay_rejects_non_positive() {
        let mut core = core(Arc::new(ManualClock::new(0)));
        assert_eq!(core.set_delay(0), Err(HalError::InvalidPollrate(0)));
        assert_eq!(core.set_delay(-5), Err(HalError::InvalidPollrate(-5)));
    }

    #[test]
    fn test_flush() {
        let pipe = EventPipe::bounded(8);
        let clock = Arc::new(ManualClock::new(77));
        let mut core = core(clock);
        core.attach_pipe(pipe.writer());

        assert_eq!(core.flush(), Err(HalError::NotEnabled(5)));

        core.set_enable(true);
        core.flush().unwrap();

        let events = pipe.reader().poll(8);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_flush_complete());
        assert_eq!(events[0].timestamp, 77);
    }

    #[test]
    fn test_full_pipe_counts_drop() {
        let pipe = EventPipe::bounded(1);
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.attach_pipe(pipe.writer());
        core.set_enable(true);

        emit(&mut core, 1, 1_000);
        emit(&mut core, 2, 1_000);

        assert_eq!(core.stats().delivered, 1);
        assert_eq!(core.stats().dropped, 1);
    }

    #[test]
    fn test_process_data_caches_output() {
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.event_mut().payload_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        core.event_mut().timestamp = 99;

        core.process_data(&SensorBaseData::new(99, 10_000));

        let output = core.output().unwrap();
        assert_eq!(&output.processed[..4], &[1.0, 2.0, 3.0, 0.0]);
        assert_eq!(output.timestamp, 99);
        assert_eq!(output.pollrate_ns, 10_000);
        assert_eq!(core.stats().processed, 1);
    }

    #[test]
    fn test_disable_clears_output() {
        let mut core = core(Arc::new(ManualClock::new(0)));
        core.set_enable(true);
        core.process_data(&SensorBaseData::new(1, 1));
        assert!(core.output().is_some());

        core.set_enable(false);
        assert!(core.output().is_none());
    }
}
