//! Event pipe between sensor nodes and the poll thread, plus the pollrate gate
//! that decides which events are allowed into it.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::error::{HResult, HalError};
use crate::sample::SensorEvent;

/// Bounded multi-producer event pipe
pub struct EventPipe {
    tx: Sender<SensorEvent>,
    rx: Receiver<SensorEvent>,
}

impl EventPipe {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Self { tx, rx }
    }

    pub fn writer(&self) -> PipeWriter {
        PipeWriter {
            tx: self.tx.clone(),
        }
    }

    pub fn reader(&self) -> PipeReader {
        PipeReader {
            rx: self.rx.clone(),
        }
    }
}

/// Write end held by each sensor node
#[derive(Clone, Debug)]
pub struct PipeWriter {
    tx: Sender<SensorEvent>,
}

impl PipeWriter {
    /// Non-blocking write
    pub fn write(&self, event: SensorEvent) -> HResult<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(HalError::PipeFull),
            Err(TrySendError::Disconnected(_)) => Err(HalError::PipeClosed),
        }
    }
}

/// Read end drained by the poll thread
#[derive(Clone, Debug)]
pub struct PipeReader {
    rx: Receiver<SensorEvent>,
}

impl PipeReader {
    /// Drain up to `max` queued events without blocking
    pub fn poll(&self, max: usize) -> Vec<SensorEvent> {
        self.rx.try_iter().take(max).collect()
    }

    /// Wait up to `timeout` for the next event
    pub fn poll_timeout(&self, timeout: Duration) -> HResult<Option<SensorEvent>> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(HalError::PipeClosed),
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Outcome of offering one event to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Deliver,
    /// Skipped to slow the producer's rate down to the requested one
    Decimated,
    /// Not newer than the last delivered event
    Stale,
}

/// Limits delivery to the consumer's requested period given the rate the
/// producer actually runs at.
///
/// The gap since the last delivery is rounded to whole producer periods, so
/// timestamp jitter does not skip a sample that is due, and a delivery never
/// comes sooner than the requested period.
#[derive(Debug, Clone, Default)]
pub struct PollrateGate {
    requested_ns: i64,
    last_timestamp: Option<i64>,
}

impl PollrateGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested_ns(&self) -> i64 {
        self.requested_ns
    }

    /// Change the period; delivery history is kept so the next event is
    /// still measured from the last one delivered.
    pub fn set_requested(&mut self, period_ns: i64) {
        self.requested_ns = period_ns;
    }

    /// Forget delivery history, keeps the requested period
    pub fn reset(&mut self) {
        self.last_timestamp = None;
    }

    pub fn admit(&mut self, timestamp: i64, hw_pollrate_ns: i64) -> GateDecision {
        if let Some(last) = self.last_timestamp {
            if timestamp <= last {
                return GateDecision::Stale;
            }
            let elapsed = producer_elapsed_ns(timestamp - last, hw_pollrate_ns);
            if elapsed < self.requested_ns {
                return GateDecision::Decimated;
            }
        }

        self.last_timestamp = Some(timestamp);
        GateDecision::Deliver
    }
}

/// Gap between two events snapped to a whole number of producer periods
fn producer_elapsed_ns(gap_ns: i64, hw_pollrate_ns: i64) -> i64 {
    if hw_pollrate_ns <= 0 {
        return gap_ns;
    }
    let periods = gap_ns.saturating_add(hw_pollrate_ns / 2) / hw_pollrate_ns;
    periods.saturating_mul(hw_pollrate_ns)
}
