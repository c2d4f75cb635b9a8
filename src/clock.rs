use std::sync::Mutex;
use std::time::Instant;

/// Source of monotonic time in fractional seconds.
///
/// The profile engine never reads a clock itself; callers sample a
/// `TimeSource` and pass the value in, which keeps the kinematics pure and
/// lets tests drive time by hand.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-free monotonic clock measured from construction.
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for deterministic tests.
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, dt: f64) {
        *self.now.lock().unwrap() += dt;
    }

    pub fn set(&self, t: f64) {
        *self.now.lock().unwrap() = t;
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}
