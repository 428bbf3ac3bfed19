//! Load-cell averaging.
//!
//! Each channel fills its own window with converted samples. When the
//! windows reach capacity the per-channel means are summed into one vehicle
//! weight and both windows are reset to empty, so every estimate averages
//! exactly one fresh window of samples.

use crate::calibration::LinearCalibration;
use crate::window::SampleWindow;

/// Samples per channel averaged into one weight estimate.
pub const WEIGHT_WINDOW: usize = 50;

pub type WeightWindow = SampleWindow<f32, WEIGHT_WINDOW>;

#[derive(Debug, Clone)]
pub struct WeightAverager {
    calibration: LinearCalibration,
    windows: [WeightWindow; 2],
    last_weight: Option<f32>,
}

impl WeightAverager {
    pub fn new(calibration: LinearCalibration) -> Self {
        Self {
            calibration,
            windows: [WeightWindow::new(), WeightWindow::new()],
            last_weight: None,
        }
    }

    /// Convert one raw sample per channel and append them. Returns the new
    /// vehicle weight when this sample completed the window.
    pub fn push_and_maybe_average(&mut self, raw: [u16; 2]) -> Option<f32> {
        for (window, r) in self.windows.iter_mut().zip(raw) {
            window.push(self.calibration.to_physical(r));
        }
        if !self.windows.iter().all(WeightWindow::is_full) {
            return None;
        }
        let weight: f32 = self.windows.iter().map(mean).sum();
        for window in &mut self.windows {
            window.clear();
        }
        self.last_weight = Some(weight);
        Some(weight)
    }

    /// Samples collected toward the next estimate.
    pub fn pending(&self) -> usize {
        self.windows[0].len()
    }

    pub fn last_weight(&self) -> Option<f32> {
        self.last_weight
    }
}

fn mean(window: &WeightWindow) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f64 = window.iter().map(f64::from).sum();
    (sum / window.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_once_per_full_window() {
        let mut avg = WeightAverager::new(LinearCalibration::default());
        for i in 0..WEIGHT_WINDOW - 1 {
            assert_eq!(avg.push_and_maybe_average([165, 165]), None, "sample {i}");
        }
        assert_eq!(avg.pending(), WEIGHT_WINDOW - 1);
        assert_eq!(avg.push_and_maybe_average([165, 165]), Some(2000.0));
        assert_eq!(avg.pending(), 0);
        assert_eq!(avg.last_weight(), Some(2000.0));
    }

    #[test]
    fn second_window_ignores_first_window_samples() {
        let mut avg = WeightAverager::new(LinearCalibration::default());
        for _ in 0..WEIGHT_WINDOW {
            avg.push_and_maybe_average([3300, 3300]);
        }
        let mut out = None;
        for _ in 0..WEIGHT_WINDOW {
            out = avg.push_and_maybe_average([0, 330]);
        }
        assert_eq!(out, Some(2000.0));
    }

    #[test]
    fn channels_are_averaged_independently() {
        let cal = LinearCalibration {
            full_scale_raw: 100,
            full_scale_weight: 100.0,
        };
        let mut avg = WeightAverager::new(cal);
        let mut out = None;
        for i in 0..WEIGHT_WINDOW as u16 {
            // ch0 alternates 10/30 (mean 20), ch1 constant 5
            let a = if i % 2 == 0 { 10 } else { 30 };
            out = avg.push_and_maybe_average([a, 5]);
        }
        assert_eq!(out, Some(25.0));
    }
}
