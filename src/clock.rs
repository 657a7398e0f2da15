//! Monotonic time source shared by every software sensor.
//!
//! Timestamps are nanoseconds since an arbitrary origin fixed at first use of
//! the process-wide [`SystemClock`]. They only compare meaningfully against
//! other readings from the same process, never against wall-clock time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lazy_static::lazy_static;

/// Anything that can stamp sensor events.
pub trait Clock: Send + Sync {
    /// Current monotonic time in nanoseconds.
    fn now_ns(&self) -> i64;
}

lazy_static! {
    static ref SYSTEM_CLOCK: Arc<SystemClock> = Arc::new(SystemClock::new());
}

/// Process-wide monotonic clock.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    fn new() -> Self {
        log::debug!("System clock initialised");
        Self {
            origin: Instant::now(),
        }
    }

    /// The single shared instance, built on first access.
    pub fn instance() -> &'static SystemClock {
        &SYSTEM_CLOCK
    }

    /// The shared instance as an injectable clock
    pub fn shared() -> Arc<dyn Clock> {
        let clock: Arc<SystemClock> = Arc::clone(&SYSTEM_CLOCK);
        clock
    }

    /// Nanoseconds since the clock origin.
    ///
    /// Panics if the reading no longer fits in an `i64` (after ~292 years of
    /// uptime); every downstream timestamp depends on this value.
    pub fn get_time(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos())
            .expect("monotonic clock overflowed i64 nanoseconds")
    }
}

impl Clock for SystemClock {
    fn now_ns(&self) -> i64 {
        self.get_time()
    }
}

/// Manually driven clock for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ns: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ns),
        }
    }

    pub fn set(&self, ns: i64) {
        self.now.store(ns, Ordering::SeqCst);
    }

    /// Move the clock forward and return the new reading.
    pub fn advance(&self, delta_ns: i64) -> i64 {
        self.now.fetch_add(delta_ns, Ordering::SeqCst) + delta_ns
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
