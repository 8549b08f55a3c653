use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in seconds since `UNIX_EPOCH`.
///
/// Commitment ages and namespace expirations are pure functions of stored
/// timestamps and `now()`, so every time-dependent component takes a clock
/// instead of reading the system time directly.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Manually advanced clock for tests and replay.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<u64>>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    pub fn set(&self, now: u64) {
        *self.now.write() = now;
    }

    pub fn advance(&self, secs: u64) {
        let mut now = self.now.write();
        *now = now.saturating_add(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        *self.now.read()
    }
}
