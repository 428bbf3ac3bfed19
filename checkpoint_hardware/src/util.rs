use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait until `read` reports `level`, or `timeout` expires.
///
/// A zero `poll_interval` busy-waits with a spin hint (needed for echo pulses
/// measured in microseconds); otherwise the caller sleeps between polls.
pub fn wait_for_level(
    mut read: impl FnMut() -> bool,
    level: bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while read() != level {
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(())
}
