pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hcsr04;
pub mod serial;
pub mod timer;
pub mod util;

use checkpoint_traits::{AnalogInput, BoxError, DigitalOutput, RangeFinder};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::HwError;

pub use serial::StreamSerial;
pub use timer::ThreadTimer;

/// Distance reported while no vehicle is in front of the sensor.
pub const SIM_ABSENT_CM: u16 = 1200;

/// Simulated ultrasonic ranger replaying a distance profile in a loop.
#[derive(Debug, Clone)]
pub struct SimulatedRanger {
    profile: Vec<u16>,
    idx: usize,
}

impl SimulatedRanger {
    /// Replay `profile` forever. An empty profile always reads as absent.
    pub fn scripted(profile: Vec<u16>) -> Self {
        Self { profile, idx: 0 }
    }

    /// One stop-and-go vehicle pass: empty lane, approach, stop at the
    /// barrier, drive off, empty lane again.
    pub fn vehicle_pass() -> Self {
        let mut profile = vec![SIM_ABSENT_CM; 20];
        // approach decelerating from 90 cm to 10 cm per sample
        let mut d: u16 = 950;
        let mut step: u16 = 90;
        while d > 150 + step {
            profile.push(d);
            d -= step;
            step = step.saturating_sub(10).max(10);
        }
        profile.extend(std::iter::repeat_n(150, 30));
        // leave accelerating
        let mut d: u16 = 150;
        let mut step: u16 = 20;
        while d < 950 {
            profile.push(d);
            d += step;
            step = (step + 20).min(120);
        }
        profile.extend(std::iter::repeat_n(SIM_ABSENT_CM, 20));
        Self::scripted(profile)
    }

    pub fn profile(&self) -> &[u16] {
        &self.profile
    }
}

impl RangeFinder for SimulatedRanger {
    fn read_distance_cm(&mut self) -> Result<u16, BoxError> {
        let Some(&cm) = self.profile.get(self.idx) else {
            return Ok(SIM_ABSENT_CM);
        };
        self.idx = (self.idx + 1) % self.profile.len();
        tracing::trace!(cm, "simulated range");
        Ok(cm)
    }
}

/// Simulated load-cell ADC with a fixed raw level per channel and a small
/// symmetric ripple so consecutive samples differ.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLoadCells {
    levels: HashMap<u8, u16>,
    ripple: u16,
    /// Ripple phase per channel, so interleaved reads still alternate.
    flips: HashMap<u8, bool>,
}

impl SimulatedLoadCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: u8, raw: u16) -> Self {
        self.levels.insert(channel, raw);
        self
    }

    /// Alternate +ripple / -ripple around each level. Averages over an even
    /// number of samples are unaffected.
    pub fn with_ripple(mut self, ripple: u16) -> Self {
        self.ripple = ripple;
        self
    }
}

impl AnalogInput for SimulatedLoadCells {
    fn read_channel(&mut self, channel: u8) -> Result<u16, BoxError> {
        let base = *self
            .levels
            .get(&channel)
            .ok_or(HwError::UnknownChannel(channel))?;
        let flip = self.flips.entry(channel).or_insert(false);
        *flip = !*flip;
        let raw = if *flip {
            base.saturating_add(self.ripple)
        } else {
            base.saturating_sub(self.ripple)
        };
        Ok(raw)
    }
}

#[derive(Debug, Default)]
struct OutputBank {
    levels: HashMap<u8, bool>,
    writes: Vec<(u8, bool)>,
}

/// Simulated digital outputs. Clones share the same pin bank, so one clone
/// can be handed to a driver while another is inspected.
#[derive(Debug, Clone, Default)]
pub struct SimulatedOutputs {
    bank: Arc<Mutex<OutputBank>>,
}

impl SimulatedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of `pin`, if it was ever driven.
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.bank
            .lock()
            .ok()
            .and_then(|b| b.levels.get(&pin).copied())
    }

    /// Every write in order, including writes that did not change the level.
    pub fn writes(&self) -> Vec<(u8, bool)> {
        self.bank.lock().map(|b| b.writes.clone()).unwrap_or_default()
    }
}

impl DigitalOutput for SimulatedOutputs {
    fn set_pin(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        let mut bank = self
            .bank
            .lock()
            .map_err(|_| HwError::Gpio("output bank poisoned".into()))?;
        bank.levels.insert(pin, level);
        bank.writes.push((pin, level));
        tracing::debug!(pin, level, "simulated output");
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub struct HardwareRanger {
    sensor: hcsr04::Hcsr04,
    max_attempts: u8,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
impl HardwareRanger {
    pub fn new(
        trigger_pin: u8,
        echo_pin: u8,
        echo_timeout: std::time::Duration,
    ) -> error::Result<Self> {
        Ok(Self {
            sensor: hcsr04::Hcsr04::new(trigger_pin, echo_pin, echo_timeout)?,
            max_attempts: 2,
        })
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
impl RangeFinder for HardwareRanger {
    fn read_distance_cm(&mut self) -> Result<u16, BoxError> {
        let mut attempts = 0;
        loop {
            match self.sensor.measure_cm() {
                Ok(cm) => return Ok(cm),
                Err(HwError::EchoTimeout) if attempts + 1 < self.max_attempts => {
                    attempts += 1;
                    tracing::debug!(retries = attempts, "echo timeout, retrying");
                }
                Err(e) => return Err(Box::new(e)),
            }
        }
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
impl DigitalOutput for hcsr04::GpioOutputs {
    fn set_pin(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        self.set(pin, level).map_err(|e| Box::new(e) as BoxError)
    }
}
