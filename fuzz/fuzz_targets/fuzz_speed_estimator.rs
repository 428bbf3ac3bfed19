#![no_main]
use checkpoint_core::{RangingCfg, SpeedEstimator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u16, Vec<u16>)| {
    let (period_ms, samples) = input;
    let mut est = SpeedEstimator::new(RangingCfg {
        period_ms: u64::from(period_ms),
        ..RangingCfg::default()
    });
    let mut peak = est.peak_speed();
    for cm in samples {
        est.push_sample(cm);
        if let Some(speed) = est.estimate_speed() {
            assert!(speed.is_finite());
        }
        assert!(est.peak_speed() >= peak);
        peak = est.peak_speed();
    }
});
