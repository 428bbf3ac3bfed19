//! `From` implementations bridging `checkpoint_config` types to `checkpoint_core` types.

use crate::calibration::LinearCalibration;
use crate::config::{
    IndicatorPins, PinCfg, RangingCfg, TelemetryCfg, Timeouts, WeighingCfg,
};

// ── RangingCfg ───────────────────────────────────────────────────────────────

impl From<&checkpoint_config::Ranging> for RangingCfg {
    fn from(c: &checkpoint_config::Ranging) -> Self {
        Self {
            period_ms: c.period_ms,
            absent_threshold_cm: c.absent_threshold_cm,
            fast_speed: c.fast_speed,
        }
    }
}

// ── WeighingCfg ──────────────────────────────────────────────────────────────

impl From<&checkpoint_config::Weighing> for WeighingCfg {
    fn from(c: &checkpoint_config::Weighing) -> Self {
        Self {
            timer_period_us: c.timer_period_us,
            channels: c.channels,
            calibration: LinearCalibration {
                full_scale_raw: c.full_scale_raw,
                full_scale_weight: c.full_scale_weight,
            },
        }
    }
}

// ── TelemetryCfg ─────────────────────────────────────────────────────────────

impl From<&checkpoint_config::Telemetry> for TelemetryCfg {
    fn from(c: &checkpoint_config::Telemetry) -> Self {
        Self {
            period_ms: c.period_ms,
        }
    }
}

// ── PinCfg ───────────────────────────────────────────────────────────────────

impl From<&checkpoint_config::Pins> for PinCfg {
    fn from(c: &checkpoint_config::Pins) -> Self {
        Self {
            indicator: IndicatorPins {
                fast: c.led_fast,
                moderate: c.led_moderate,
                idle: c.led_idle,
            },
            barrier: c.barrier,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&checkpoint_config::Hardware> for Timeouts {
    fn from(c: &checkpoint_config::Hardware) -> Self {
        Self {
            sensor_ms: c.sensor_read_timeout_ms,
        }
    }
}
