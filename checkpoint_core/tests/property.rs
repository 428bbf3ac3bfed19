use checkpoint_core::mocks::SpyOutput;
use checkpoint_core::{
    BarrierCommand, BarrierController, BarrierState, DISTANCE_WINDOW, LinearCalibration,
    RangingCfg, SampleWindow, SpeedEstimator, WEIGHT_WINDOW, WeightAverager,
};
use proptest::prelude::*;

prop_compose! {
    fn distances()(v in prop::collection::vec(0u16..1500, 0..120)) -> Vec<u16> {
        v
    }
}

proptest! {
    #[test]
    fn peak_never_decreases(samples in distances(), period_ms in 1u64..500) {
        let mut est = SpeedEstimator::new(RangingCfg { period_ms, ..RangingCfg::default() });
        let mut prev = est.peak_speed();
        prop_assert_eq!(prev, 0.0);
        for cm in samples {
            est.push_sample(cm);
            let _ = est.estimate_speed();
            prop_assert!(est.peak_speed() >= prev);
            prev = est.peak_speed();
        }
    }

    #[test]
    fn estimate_uses_only_two_newest(
        history in distances(),
        a in 0u16..999,
        b in 0u16..999,
    ) {
        let cfg = RangingCfg::default();
        let mut with_history = SpeedEstimator::new(cfg.clone());
        for cm in history {
            with_history.push_sample(cm);
        }
        with_history.push_sample(a);
        with_history.push_sample(b);

        let mut fresh = SpeedEstimator::new(cfg);
        fresh.push_sample(a);
        fresh.push_sample(b);

        prop_assert_eq!(with_history.estimate_speed(), fresh.estimate_speed());
        prop_assert!(with_history.window().len() <= DISTANCE_WINDOW);
    }

    #[test]
    fn window_keeps_newest_in_order(values in prop::collection::vec(any::<u16>(), 0..40)) {
        let mut w = SampleWindow::<u16, 7>::new();
        for &v in &values {
            w.push(v);
        }
        let keep = values.len().min(7);
        let expected: Vec<u16> = values[values.len() - keep..].to_vec();
        prop_assert_eq!(w.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn calibration_is_monotone(raw_a in any::<u16>(), raw_b in any::<u16>()) {
        let cal = LinearCalibration::default();
        let (lo, hi) = if raw_a <= raw_b { (raw_a, raw_b) } else { (raw_b, raw_a) };
        prop_assert!(cal.to_physical(lo) <= cal.to_physical(hi));
        prop_assert_eq!(cal.to_physical(0), 0.0);
    }

    #[test]
    fn calibration_is_exactly_linear(
        full_scale_raw in 1u16..=u16::MAX,
        full_scale_weight in 0.001f32..1.0e6,
        raw in any::<u16>(),
    ) {
        let cal = LinearCalibration { full_scale_raw, full_scale_weight };
        let want = (f64::from(raw) * f64::from(full_scale_weight) / f64::from(full_scale_raw)) as f32;
        prop_assert_eq!(cal.to_physical(raw), want);
        prop_assert_eq!(cal.to_physical(full_scale_raw), full_scale_weight);
        prop_assert_eq!(cal.to_physical(0), 0.0);
    }

    #[test]
    fn non_command_bytes_leave_barrier_alone(
        start_open in any::<bool>(),
        bytes in prop::collection::vec(
            any::<u8>().prop_filter("not a command", |b| *b != b'o' && *b != b'c'),
            1..64,
        ),
    ) {
        let spy = SpyOutput::default();
        let mut barrier = BarrierController::new(spy.clone(), 11);
        let start = if start_open {
            barrier.apply(BarrierCommand::Open);
            BarrierState::Open
        } else {
            BarrierState::Closed
        };
        let writes_before = spy.writes().len();

        for b in bytes {
            prop_assert_eq!(barrier.handle_byte(b), None);
        }
        prop_assert_eq!(barrier.state(), start);
        prop_assert_eq!(spy.writes().len(), writes_before);
    }

    #[test]
    fn averaged_weight_is_sum_of_channel_means(
        ch0 in prop::collection::vec(0u16..4000, WEIGHT_WINDOW),
        ch1 in prop::collection::vec(0u16..4000, WEIGHT_WINDOW),
    ) {
        let cal = LinearCalibration::default();
        let mut avg = WeightAverager::new(cal);
        let mut out = None;
        for (i, (&a, &b)) in ch0.iter().zip(&ch1).enumerate() {
            out = avg.push_and_maybe_average([a, b]);
            if i + 1 < WEIGHT_WINDOW {
                prop_assert_eq!(out, None);
            }
        }
        let mean = |v: &[u16]| {
            v.iter().map(|&r| f64::from(cal.to_physical(r))).sum::<f64>() / v.len() as f64
        };
        let want = mean(&ch0) + mean(&ch1);
        let got = f64::from(out.unwrap_or(f32::NAN));
        prop_assert!((got - want).abs() <= want.abs() * 1e-5 + 1e-3, "got {got}, want {want}");
        prop_assert_eq!(avg.pending(), 0);
    }
}
