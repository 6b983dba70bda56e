//! Sleep abstraction so retry delays are deterministic in tests.

use std::time::Duration;

/// Clock trait for the delays between retry attempts.
pub trait Clock: Send + Sync {
    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// System clock using real thread sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Mock clock that records requested delays instead of sleeping.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
pub struct MockClock {
    slept: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock with an empty delay log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Sum of all requested delays.
    pub fn total_slept(&self) -> Duration {
        self.sleeps().into_iter().sum()
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut slept) = self.slept.lock() {
            slept.push(duration);
        }
    }
}
