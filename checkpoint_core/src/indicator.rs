//! Three-light speed indicator.
//!
//! Exactly one light is lit at a time. Lines are only written when the band
//! changes; a failed write leaves the indicator marked unknown so the next
//! `show` retries.

use checkpoint_traits::DigitalOutput;

use crate::config::IndicatorPins;
use crate::error::MonitorError;
use crate::hw_error::map_hw_error;
use crate::speed::SpeedBand;

pub struct SpeedIndicator<O> {
    output: O,
    pins: IndicatorPins,
    shown: Option<SpeedBand>,
}

impl<O: DigitalOutput> SpeedIndicator<O> {
    pub fn new(output: O, pins: IndicatorPins) -> Self {
        Self {
            output,
            pins,
            shown: None,
        }
    }

    /// Band currently lit, `None` before the first successful write.
    pub fn shown(&self) -> Option<SpeedBand> {
        self.shown
    }

    fn pin_for(&self, band: SpeedBand) -> u8 {
        match band {
            SpeedBand::Fast => self.pins.fast,
            SpeedBand::Moderate => self.pins.moderate,
            SpeedBand::Idle => self.pins.idle,
        }
    }

    /// Light `band` and turn the other two off.
    pub fn show(&mut self, band: SpeedBand) -> Result<(), MonitorError> {
        if self.shown == Some(band) {
            return Ok(());
        }
        self.shown = None;
        let lit = self.pin_for(band);
        for other in [SpeedBand::Fast, SpeedBand::Moderate, SpeedBand::Idle] {
            if other != band {
                let pin = self.pin_for(other);
                self.output
                    .set_pin(pin, false)
                    .map_err(|e| map_hw_error(&*e))?;
            }
        }
        self.output
            .set_pin(lit, true)
            .map_err(|e| map_hw_error(&*e))?;
        self.shown = Some(band);
        tracing::debug!(band = band.name(), "indicator");
        Ok(())
    }
}
