//! Owns the software sensors, routes upstream samples to the nodes they
//! trigger, and exposes the per-handle control operations.

use std::collections::HashMap;
use std::sync::Arc;

use crate::base::NodeStats;
use crate::clock::Clock;
use crate::config::{HalConfig, SwSensorEntry, SwSensorKind};
use crate::derived::{SwGravity, SwLinearAcceleration};
use crate::descriptor::SensorDescriptor;
use crate::error::{HResult, HalError};
use crate::game_rotation::SwGameRotationVector;
use crate::node::SensorNode;
use crate::pipe::{EventPipe, PipeReader};
use crate::sample::{SensorBaseData, SensorEvent};
use crate::sensor_type::SensorType;

/// Longest chain of node-to-node forwarding followed for one upstream sample
pub const MAX_CASCADE_DEPTH: usize = 4;

pub fn build_node(entry: &SwSensorEntry, clock: Arc<dyn Clock>) -> Box<dyn SensorNode> {
    match entry.kind {
        SwSensorKind::GameRotationVector => {
            Box::new(SwGameRotationVector::new(&entry.name, entry.handle, clock))
        }
        SwSensorKind::Gravity => Box::new(SwGravity::new(&entry.name, entry.handle, clock)),
        SwSensorKind::LinearAcceleration => {
            Box::new(SwLinearAcceleration::new(&entry.name, entry.handle, clock))
        }
    }
}

pub struct SensorHub {
    nodes: Vec<Box<dyn SensorNode>>,
    upstream: HashMap<SensorType, SensorDescriptor>,
    pipe: EventPipe,
    clock: Arc<dyn Clock>,
    default_pollrate_ns: i64,
}

impl SensorHub {
    pub fn new(pipe_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            nodes: Vec::new(),
            upstream: HashMap::new(),
            pipe: EventPipe::bounded(pipe_capacity),
            clock,
            default_pollrate_ns: HalConfig::default().default_pollrate_ns,
        }
    }

    pub fn from_config(config: &HalConfig, clock: Arc<dyn Clock>) -> HResult<Self> {
        config.validate()?;

        let mut hub = Self::new(config.pipe_capacity, clock);
        hub.default_pollrate_ns = config.default_pollrate_ns;
        hub.register_upstream(config.fusion.descriptor(&config.vendor))?;

        for entry in &config.sensors {
            let mut node = build_node(entry, Arc::clone(&hub.clock));
            node.core_mut().descriptor_mut().vendor = config.vendor.clone();
            node.core_mut().set_discard_on_enable(config.samples_to_discard);
            hub.register(node)?;
        }

        log::info!(
            "Sensor hub ready: {} software sensors, pipe capacity {}",
            hub.nodes.len(),
            config.pipe_capacity
        );
        Ok(hub)
    }

    /// Record the descriptor of an externally driven producer
    pub fn register_upstream(&mut self, descriptor: SensorDescriptor) -> HResult<()> {
        if self.upstream.contains_key(&descriptor.sensor_type) {
            return Err(HalError::InvalidDependency(format!(
                "upstream {} already registered",
                descriptor.string_type
            )));
        }
        if self.handle_in_use(descriptor.handle) {
            return Err(HalError::DuplicateHandle(descriptor.handle));
        }

        for node in self
            .nodes
            .iter_mut()
            .filter(|n| n.trigger_type() == Some(descriptor.sensor_type))
        {
            node.core_mut().resolve_dependency(&descriptor);
        }

        self.upstream.insert(descriptor.sensor_type, descriptor);
        Ok(())
    }

    pub fn register(&mut self, mut node: Box<dyn SensorNode>) -> HResult<()> {
        let handle = node.handle();
        if self.handle_in_use(handle) {
            return Err(HalError::DuplicateHandle(handle));
        }

        let Some(trigger) = node.trigger_type() else {
            return Err(HalError::InvalidDependency(format!(
                "sensor {} has no trigger dependency",
                handle
            )));
        };
        if node.dependencies().contains(&node.sensor_type()) {
            return Err(HalError::InvalidDependency(format!(
                "sensor {} depends on its own output",
                handle
            )));
        }

        node.core_mut().attach_pipe(self.pipe.writer());

        let dependency = self.upstream.get(&trigger).cloned().or_else(|| {
            self.nodes
                .iter()
                .find(|n| n.sensor_type() == trigger)
                .map(|n| n.descriptor().clone())
        });
        if let Some(dependency) = dependency {
            node.core_mut().resolve_dependency(&dependency);
        }

        log::info!(
            "Registered {} (handle {}, {})",
            node.descriptor().name,
            handle,
            node.descriptor().string_type
        );
        self.nodes.push(node);
        Ok(())
    }

    fn handle_in_use(&self, handle: i32) -> bool {
        self.nodes.iter().any(|n| n.handle() == handle)
            || self.upstream.values().any(|d| d.handle == handle)
    }

    pub fn node(&self, handle: i32) -> Option<&dyn SensorNode> {
        self.nodes
            .iter()
            .find(|n| n.handle() == handle)
            .map(|n| &**n)
    }

    fn node_mut(&mut self, handle: i32) -> HResult<&mut Box<dyn SensorNode>> {
        self.nodes
            .iter_mut()
            .find(|n| n.handle() == handle)
            .ok_or(HalError::UnknownHandle(handle))
    }

    /// Sensor list: upstream producers first, then software sensors
    pub fn descriptors(&self) -> Vec<SensorDescriptor> {
        let mut list: Vec<SensorDescriptor> = self.upstream.values().cloned().collect();
        list.sort_by_key(|d| d.handle);
        list.extend(self.nodes.iter().map(|n| n.descriptor().clone()));
        list
    }

    pub fn set_enable(&mut self, handle: i32, enable: bool) -> HResult<()> {
        let default_pollrate_ns = self.default_pollrate_ns;
        let node = self.node_mut(handle)?;

        if enable && node.core().requested_pollrate_ns() == 0 {
            node.core_mut().set_delay(default_pollrate_ns)?;
        }
        node.core_mut().set_enable(enable);
        Ok(())
    }

    pub fn set_delay(&mut self, handle: i32, period_ns: i64) -> HResult<i64> {
        self.node_mut(handle)?.core_mut().set_delay(period_ns)
    }

    pub fn flush(&mut self, handle: i32) -> HResult<()> {
        self.node_mut(handle)?.core_mut().flush()
    }

    pub fn stats(&self, handle: i32) -> HResult<NodeStats> {
        self.node(handle)
            .map(|n| n.core().stats().clone())
            .ok_or(HalError::UnknownHandle(handle))
    }

    /// Fastest period requested by enabled sensors downstream of `source`,
    /// directly or through other software sensors, i.e. the rate that
    /// producer has to run at. `None` when nothing enabled depends on it.
    pub fn dependency_pollrate(&self, source: SensorType) -> Option<i64> {
        let mut sources = vec![source];
        let mut visited = Vec::new();
        let mut fastest: Option<i64> = None;

        while let Some(source) = sources.pop() {
            if visited.contains(&source) {
                continue;
            }
            visited.push(source);

            for node in self.nodes.iter().filter(|n| n.trigger_type() == Some(source)) {
                let period = node.core().requested_pollrate_ns();
                if node.core().is_enabled() && period > 0 {
                    fastest = Some(fastest.map_or(period, |f| f.min(period)));
                }
                sources.push(node.sensor_type());
            }
        }

        fastest
    }

    /// Nodes that have to run: enabled ones plus every node whose output an
    /// active node is triggered by.
    fn active_nodes(&self) -> Vec<bool> {
        let mut active: Vec<bool> = self.nodes.iter().map(|n| n.core().is_enabled()).collect();

        // Each pass pulls activity one level upstream
        for _ in 0..=MAX_CASCADE_DEPTH {
            let mut changed = false;
            for i in 0..self.nodes.len() {
                if active[i] {
                    continue;
                }
                let output = Some(self.nodes[i].sensor_type());
                let needed = self
                    .nodes
                    .iter()
                    .zip(&active)
                    .any(|(n, &is_active)| is_active && n.trigger_type() == output);
                if needed {
                    active[i] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        active
    }

    /// Run a sample from `source` through every active node it triggers,
    /// then through the nodes those outputs trigger. Returns the number of
    /// transform cycles run.
    pub fn deliver(&mut self, source: SensorType, sample: &SensorBaseData) -> usize {
        let active = self.active_nodes();
        let mut pending = vec![(source, *sample, 0usize)];
        let mut cycles = 0;

        while let Some((source, sample, depth)) = pending.pop() {
            if depth > MAX_CASCADE_DEPTH {
                log::warn!("Dropping forward from {:?}: cascade too deep", source);
                continue;
            }

            for (node, _) in self
                .nodes
                .iter_mut()
                .zip(&active)
                .filter(|(n, is_active)| **is_active && n.trigger_type() == Some(source))
            {
                node.process_data(&sample);
                cycles += 1;

                if let Some(output) = node.core().output() {
                    pending.push((node.sensor_type(), *output, depth + 1));
                }
            }
        }

        cycles
    }

    pub fn reader(&self) -> PipeReader {
        self.pipe.reader()
    }

    pub fn poll_events(&self, max: usize) -> Vec<SensorEvent> {
        self.pipe.reader().poll(max)
    }
}
