//! Time sources for the convergence waiter.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Abstraction over time so waits can be tested deterministically.
///
/// Production code injects [`SystemClock`]. Tests inject [`ManualClock`],
/// whose `sleep` advances virtual time instead of blocking.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Monotonic instant for elapsed/deadline comparisons.
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant` and `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock that only moves when slept on or advanced.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move virtual time forward, e.g. to simulate fetch latency.
    pub fn advance(&self, duration: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += duration;
    }

    /// Virtual time elapsed since creation.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn manual_clock_sleep_advances_without_blocking() {
        let clock = ManualClock::new();
        let start = clock.now();
        let wall = Instant::now();

        clock.sleep(Duration::from_secs(3600));

        assert_eq!(clock.now() - start, Duration::from_secs(3600));
        assert!(wall.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn manual_clock_advance_accumulates() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_millis(750));
        assert_eq!(clock.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn system_clock_sleeps() {
        let clock = SystemClock;
        let start = clock.now();
        clock.sleep(Duration::from_millis(10));
        assert!(clock.now() - start >= Duration::from_millis(10));
    }
}
