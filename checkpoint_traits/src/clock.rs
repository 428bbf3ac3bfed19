use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock used to pace the sampling tasks.
///
/// - now(): returns a monotonic Instant
/// - sleep(): blocks the calling task for the provided duration (implementations may simulate)
/// - ms_since(): elapsed milliseconds from an epoch Instant, used for sensor health stamps
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Wall-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clocks for tests (enable feature `test-clock` from other crates).
#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;

    /// Clock whose time only moves when advanced.
    ///
    /// now() = origin + offset
    /// sleep(d) advances internal time by d and yields instead of blocking,
    /// so paced loops still make progress in tests.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: std::sync::Arc<std::sync::Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: std::sync::Arc::new(std::sync::Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = off.saturating_add(d);
            }
        }

        /// Set the absolute offset relative to origin (useful for tests).
        pub fn set_offset(&self, d: Duration) {
            if let Ok(mut off) = self.offset.lock() {
                *off = d;
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
            self.origin + off
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
            thread::yield_now();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn sleep_advances_without_blocking() {
            let clock = TestClock::new();
            let epoch = clock.now();
            let wall = Instant::now();
            clock.sleep(Duration::from_secs(5));
            assert_eq!(clock.ms_since(epoch), 5_000);
            assert!(wall.elapsed() < Duration::from_secs(1));
        }

        #[test]
        fn set_offset_is_absolute() {
            let clock = TestClock::new();
            let epoch = clock.now();
            clock.advance(Duration::from_millis(300));
            clock.set_offset(Duration::from_millis(100));
            assert_eq!(clock.ms_since(epoch), 100);
        }
    }
}
