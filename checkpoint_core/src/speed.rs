//! Windowed-derivative speed estimation.
//!
//! Speed is the difference of the two newest distance samples divided by the
//! sampling interval: `(latest - previous) / period_ms`, in centimeters per
//! millisecond. Sign is preserved: negative means the distance shrank, i.e.
//! the vehicle is approaching the sensor. Estimates are never clamped.

use crate::config::RangingCfg;
use crate::window::SampleWindow;

/// Distance samples kept by the ranging task.
pub const DISTANCE_WINDOW: usize = 10;

pub type DistanceWindow = SampleWindow<u16, DISTANCE_WINDOW>;

/// Three-level speed indicator band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedBand {
    Fast,
    Moderate,
    #[default]
    Idle,
}

impl SpeedBand {
    /// `speed >= fast` → Fast, `0 < speed < fast` → Moderate, else Idle.
    pub fn classify(speed: f32, fast: f32) -> Self {
        if speed >= fast {
            SpeedBand::Fast
        } else if speed > 0.0 {
            SpeedBand::Moderate
        } else {
            SpeedBand::Idle
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SpeedBand::Fast => "fast",
            SpeedBand::Moderate => "moderate",
            SpeedBand::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    window: DistanceWindow,
    cfg: RangingCfg,
    last: Option<f32>,
    peak: f32,
    band: SpeedBand,
}

impl SpeedEstimator {
    pub fn new(cfg: RangingCfg) -> Self {
        Self {
            window: DistanceWindow::new(),
            cfg,
            last: None,
            peak: 0.0,
            band: SpeedBand::Idle,
        }
    }

    /// Insert a distance reading, evicting the oldest at capacity.
    pub fn push_sample(&mut self, cm: u16) {
        self.window.push(cm);
    }

    /// Whether the newest reading shows a vehicle in range.
    pub fn target_present(&self) -> bool {
        self.window
            .latest()
            .is_some_and(|cm| cm < self.cfg.absent_threshold_cm)
    }

    /// Estimate speed from the two newest samples.
    ///
    /// Returns `None` without touching peak or band while warming up (fewer
    /// than two samples) or when no vehicle is present.
    pub fn estimate_speed(&mut self) -> Option<f32> {
        if !self.target_present() {
            return None;
        }
        let latest = self.window.latest()?;
        let previous = self.window.previous()?;
        let dt = self.cfg.period_ms.max(1) as f32;
        let speed = (f32::from(latest) - f32::from(previous)) / dt;

        self.last = Some(speed);
        self.peak = self.peak.max(speed);
        self.band = SpeedBand::classify(speed, self.cfg.fast_speed);
        Some(speed)
    }

    /// Most recent estimate, if any was ever computed.
    pub fn last_speed(&self) -> Option<f32> {
        self.last
    }

    /// Highest estimate seen since start. Starts at 0 and never decreases.
    pub fn peak_speed(&self) -> f32 {
        self.peak
    }

    /// Band of the most recent estimate; Idle until one is computed.
    pub fn band(&self) -> SpeedBand {
        self.band
    }

    pub fn window(&self) -> &DistanceWindow {
        &self.window
    }
}
