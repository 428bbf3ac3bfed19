/// Two-point linear calibration from raw ADC counts to weight units.
///
/// `0 ↦ 0` and `full_scale_raw ↦ full_scale_weight`, linear in between
/// (and extrapolated above full scale). Fixed once the monitor starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    pub full_scale_raw: u16,
    pub full_scale_weight: f32,
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self {
            full_scale_raw: 3300, // ADC full scale in mV
            full_scale_weight: 20_000.0,
        }
    }
}

impl LinearCalibration {
    /// Convert a raw sample to weight units.
    ///
    /// The product is formed in f64, where `raw * full_scale_weight` is exact
    /// for any u16 and f32 input, so both calibration points map exactly.
    pub fn to_physical(&self, raw: u16) -> f32 {
        if self.full_scale_raw == 0 {
            return 0.0;
        }
        let w = f64::from(raw) * f64::from(self.full_scale_weight)
            / f64::from(self.full_scale_raw);
        w as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0.0)]
    #[case(165, 1000.0)]
    #[case(1650, 10_000.0)]
    #[case(3300, 20_000.0)]
    fn default_calibration_points(#[case] raw: u16, #[case] want: f32) {
        assert_eq!(LinearCalibration::default().to_physical(raw), want);
    }

    #[test]
    fn full_scale_maps_to_full_weight() {
        let cal = LinearCalibration {
            full_scale_raw: 4095,
            full_scale_weight: 1234.5,
        };
        assert_eq!(cal.to_physical(4095), 1234.5);
        assert_eq!(cal.to_physical(0), 0.0);
    }

    #[test]
    fn zero_full_scale_reads_zero() {
        let cal = LinearCalibration {
            full_scale_raw: 0,
            full_scale_weight: 100.0,
        };
        assert_eq!(cal.to_physical(500), 0.0);
    }
}
