#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the checkpoint monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML; every section has
//!   defaults so an empty file is a valid config.
//! - `Config::validate` rejects values the tasks cannot run with.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Pins {
    /// HC-SR04 trigger line
    pub trigger: u8,
    /// HC-SR04 echo line
    pub echo: u8,
    /// Barrier actuator output
    pub barrier: u8,
    pub led_fast: u8,
    pub led_moderate: u8,
    pub led_idle: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            trigger: 2,
            echo: 3,
            barrier: 11,
            led_fast: 22,
            led_moderate: 23,
            led_idle: 24,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Ranging {
    /// Distance sampling period (ms); also the Δt of the speed estimate.
    pub period_ms: u64,
    /// Readings above this many cm mean no vehicle is present.
    pub absent_threshold_cm: u16,
    /// Speeds at or above this value light the "fast" indicator.
    pub fast_speed: f32,
}

impl Default for Ranging {
    fn default() -> Self {
        Self {
            period_ms: 100,
            absent_threshold_cm: 1000,
            fast_speed: 8.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Weighing {
    /// Hardware timer period that wakes the weighing task (µs).
    pub timer_period_us: u64,
    /// The two load-cell ADC channels.
    pub channels: [u8; 2],
    /// Raw ADC reading at full scale (two-point calibration, upper point).
    pub full_scale_raw: u16,
    /// Physical weight at `full_scale_raw`.
    pub full_scale_weight: f32,
}

impl Default for Weighing {
    fn default() -> Self {
        Self {
            timer_period_us: 5000,
            channels: [1, 2],
            full_scale_raw: 3300,
            full_scale_weight: 20_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Telemetry {
    /// Report period (ms).
    pub period_ms: u64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self { period_ms: 250 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for an ultrasonic echo before the read fails
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub ranging: Ranging,
    pub weighing: Weighing,
    pub telemetry: Telemetry,
    pub hardware: Hardware,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Ranging
        if self.ranging.period_ms == 0 {
            eyre::bail!("ranging.period_ms must be >= 1");
        }
        if self.ranging.absent_threshold_cm == 0 {
            eyre::bail!("ranging.absent_threshold_cm must be >= 1");
        }
        if !(self.ranging.fast_speed.is_finite() && self.ranging.fast_speed > 0.0) {
            eyre::bail!("ranging.fast_speed must be a positive number");
        }

        // Weighing
        if self.weighing.timer_period_us == 0 {
            eyre::bail!("weighing.timer_period_us must be >= 1");
        }
        if self.weighing.channels[0] == self.weighing.channels[1] {
            eyre::bail!(
                "weighing.channels must name two different channels, got {:?}",
                self.weighing.channels
            );
        }
        if self.weighing.full_scale_raw == 0 {
            eyre::bail!("weighing.full_scale_raw must be >= 1");
        }
        if !(self.weighing.full_scale_weight.is_finite() && self.weighing.full_scale_weight > 0.0)
        {
            eyre::bail!("weighing.full_scale_weight must be a positive number");
        }

        // Telemetry
        if self.telemetry.period_ms == 0 {
            eyre::bail!("telemetry.period_ms must be >= 1");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Pins: every line drives or reads a distinct GPIO
        let p = &self.pins;
        let all = [
            ("trigger", p.trigger),
            ("echo", p.echo),
            ("barrier", p.barrier),
            ("led_fast", p.led_fast),
            ("led_moderate", p.led_moderate),
            ("led_idle", p.led_idle),
        ];
        for (i, (name_a, a)) in all.iter().enumerate() {
            if let Some((name_b, _)) = all[i + 1..].iter().find(|(_, b)| b == a) {
                eyre::bail!("pins.{name_a} and pins.{name_b} both use GPIO {a}");
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
