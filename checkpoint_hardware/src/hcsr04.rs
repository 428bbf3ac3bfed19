use std::time::{Duration, Instant};
use tracing::trace;

use crate::error::Result;
use crate::util::wait_for_level;

/// Round-trip microseconds per centimeter of range (speed of sound, ~20 °C).
const US_PER_CM: u128 = 58;

pub struct Hcsr04 {
    trigger: rppal::gpio::OutputPin,
    echo: rppal::gpio::InputPin,
    echo_timeout: Duration,
}

impl Hcsr04 {
    pub fn new(trigger_pin: u8, echo_pin: u8, echo_timeout: Duration) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new()?;
        let mut trigger = gpio.get(trigger_pin)?.into_output();
        let echo = gpio.get(echo_pin)?.into_input();
        trigger.set_low(); // idle low
        Ok(Self {
            trigger,
            echo,
            echo_timeout,
        })
    }

    pub fn measure_cm(&mut self) -> Result<u16> {
        // 10 µs trigger pulse
        self.trigger.set_high();
        let pulse = Instant::now();
        while pulse.elapsed() < Duration::from_micros(10) {
            std::hint::spin_loop();
        }
        self.trigger.set_low();

        let echo = &self.echo;
        wait_for_level(|| echo.is_high(), true, self.echo_timeout, Duration::ZERO)?;
        let rise = Instant::now();
        wait_for_level(|| echo.is_high(), false, self.echo_timeout, Duration::ZERO)?;
        let width_us = rise.elapsed().as_micros();

        let cm = (width_us / US_PER_CM).min(u128::from(u16::MAX)) as u16;
        trace!(width_us = width_us as u64, cm, "hc-sr04 echo");
        Ok(cm)
    }
}

/// Named GPIO outputs driven through `DigitalOutput`.
pub struct GpioOutputs {
    pins: std::collections::HashMap<u8, rppal::gpio::OutputPin>,
}

impl GpioOutputs {
    pub fn new(pins: &[u8]) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new()?;
        let mut map = std::collections::HashMap::with_capacity(pins.len());
        for &pin in pins {
            let mut out = gpio.get(pin)?.into_output();
            out.set_low();
            map.insert(pin, out);
        }
        Ok(Self { pins: map })
    }

    pub fn set(&mut self, pin: u8, level: bool) -> Result<()> {
        let out = self
            .pins
            .get_mut(&pin)
            .ok_or(crate::error::HwError::UnknownPin(pin))?;
        if level {
            out.set_high();
        } else {
            out.set_low();
        }
        Ok(())
    }
}
