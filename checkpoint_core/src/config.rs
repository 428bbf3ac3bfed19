//! Runtime configuration for the monitor tasks.
//!
//! These are the structs the tasks consume. They are separate from the
//! TOML-deserialized config in `checkpoint_config`; see `conversions`.

use crate::calibration::LinearCalibration;

/// Ranging task and speed estimator configuration.
#[derive(Debug, Clone)]
pub struct RangingCfg {
    /// Sampling period in ms; also the Δt divisor of the speed estimate.
    pub period_ms: u64,
    /// A newest reading at or above this distance means no vehicle is present.
    pub absent_threshold_cm: u16,
    /// Speeds at or above this value select the "fast" band.
    pub fast_speed: f32,
}

impl Default for RangingCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            absent_threshold_cm: 1000,
            fast_speed: 8.0,
        }
    }
}

/// Weighing task configuration.
#[derive(Debug, Clone)]
pub struct WeighingCfg {
    /// Period of the hardware timer that wakes the weighing task (µs).
    pub timer_period_us: u64,
    /// Load-cell ADC channels, summed into one vehicle weight.
    pub channels: [u8; 2],
    pub calibration: LinearCalibration,
}

impl Default for WeighingCfg {
    fn default() -> Self {
        Self {
            timer_period_us: 5000,
            channels: [1, 2],
            calibration: LinearCalibration::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryCfg {
    pub period_ms: u64,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self { period_ms: 250 }
    }
}

/// Output lines of the three-level speed indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPins {
    pub fast: u8,
    pub moderate: u8,
    pub idle: u8,
}

impl Default for IndicatorPins {
    fn default() -> Self {
        Self {
            fast: 22,
            moderate: 23,
            idle: 24,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PinCfg {
    pub indicator: IndicatorPins,
    /// Barrier actuator output; high = open.
    pub barrier: u8,
}

impl Default for PinCfg {
    fn default() -> Self {
        Self {
            indicator: IndicatorPins::default(),
            barrier: 11,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 50 }
    }
}
