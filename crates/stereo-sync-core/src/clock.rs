//! Time sources used to stamp emitted pairs.

use crate::types::Time;
use chrono::Utc;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// Reads the time that is written into the headers of an emitted pair.
pub trait Clock: Send + Sync {
    fn now(&self) -> Time;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        let now = Utc::now();
        let sec = i32::try_from(now.timestamp()).unwrap_or(i32::MAX);
        Time::new(sec, now.timestamp_subsec_nanos())
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a handle can be kept to
/// drive a clock that was moved into a synchronizer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        let clock = Self::default();
        clock.set(start);
        clock
    }

    pub fn set(&self, time: Duration) {
        self.nanos.store(saturating_nanos(time), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: Duration) {
        let delta = saturating_nanos(delta);
        // Always Ok: the closure never returns None.
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |nanos| {
                Some(nanos.saturating_add(delta))
            });
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Nanoseconds in a duration, saturating at `u64::MAX` (about 584 years).
fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        Time::from_duration(self.elapsed())
    }
}
