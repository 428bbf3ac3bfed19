//! Common time/period helpers for checkpoint_core.

use std::time::Duration;

/// Longest single sleep a task takes before re-checking its shutdown flag.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(20);

/// Period as a `Duration`, clamped to at least 1 ms.
#[inline]
pub fn period_from_ms(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

/// Timer period as a `Duration`, clamped to at least 1 µs.
#[inline]
pub fn period_from_us(us: u64) -> Duration {
    Duration::from_micros(us.max(1))
}

/// Duration in whole milliseconds, saturating at `u64::MAX`.
#[inline]
pub fn saturating_ms(d: Duration) -> u64 {
    (d.as_millis().min(u128::from(u64::MAX))) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_periods_clamp() {
        assert_eq!(period_from_ms(0), Duration::from_millis(1));
        assert_eq!(period_from_us(0), Duration::from_micros(1));
        assert_eq!(period_from_ms(250), Duration::from_millis(250));
    }

    #[test]
    fn saturating_ms_caps() {
        assert_eq!(saturating_ms(Duration::from_secs(2)), 2_000);
        assert_eq!(saturating_ms(Duration::MAX), u64::MAX);
    }
}
