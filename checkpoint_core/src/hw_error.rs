//! Maps `BoxError` from driver trait boundaries to typed `MonitorError`.
//!
//! The traits in `checkpoint_traits` use `Box<dyn Error + Send + Sync>`;
//! this module converts those to our typed error enum, with an optional
//! feature-gated path for `checkpoint_hardware::HwError` downcasting.

use crate::error::MonitorError;

/// Map a trait-boundary error to a typed `MonitorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> MonitorError {
    #[cfg(feature = "hardware-errors")]
    {
        use checkpoint_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::EchoTimeout => MonitorError::Timeout,
                HwError::UnknownChannel(_) | HwError::UnknownPin(_) => {
                    MonitorError::Config(hw.to_string())
                }
                HwError::TimerNotConfigured
                | HwError::TimerAlreadyStarted
                | HwError::HandlerAlreadyRegistered => MonitorError::State(hw.to_string()),
                other => MonitorError::HardwareFault(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        MonitorError::Timeout
    } else {
        MonitorError::Hardware(s)
    }
}
