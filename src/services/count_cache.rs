//! Short-lived memo of the unfiltered row count.
//!
//! Only the no-predicate search consults this cache. Entries are never
//! invalidated explicitly; a value is served while it is younger than the
//! TTL and overwritten on the next recount. Concurrent recounts simply race
//! to store the same number.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// Time source, injectable so tests can step past the TTL
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedCount {
    pub value: i64,
    pub computed_at: DateTime<Utc>,
}

pub struct CountCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<CachedCount>>,
}

impl CountCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached total, if one exists and is still fresh
    pub fn get(&self) -> Option<i64> {
        let now = self.clock.now();
        let cached = (*self.slot.lock().ok()?)?;
        (now - cached.computed_at < self.ttl).then_some(cached.value)
    }

    /// Overwrite the cached total, stamped with the current time
    pub fn store(&self, value: i64) {
        let computed_at = self.clock.now();
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(CachedCount { value, computed_at });
        }
    }
}

/// Clock that only moves when told to
#[cfg(test)]
pub(crate) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
