//! Checkpoint behaviour driven through the pure components, without threads.

use checkpoint_core::mocks::SpyOutput;
use checkpoint_core::{
    BarrierController, BarrierState, LinearCalibration, RangingCfg, SpeedBand, SpeedEstimator,
    WEIGHT_WINDOW, WeightAverager,
};
use rstest::rstest;

fn feed(est: &mut SpeedEstimator, samples: &[u16]) -> Vec<Option<f32>> {
    samples
        .iter()
        .map(|&cm| {
            est.push_sample(cm);
            est.estimate_speed()
        })
        .collect()
}

#[test]
fn absent_vehicle_never_estimates() {
    let mut est = SpeedEstimator::new(RangingCfg::default());
    let out = feed(&mut est, &[1200; 25]);
    assert!(out.iter().all(Option::is_none));
    assert_eq!(est.band(), SpeedBand::Idle);
    assert_eq!(est.peak_speed(), 0.0);
    assert_eq!(est.window().len(), 10);
}

#[test]
fn approaching_vehicle_is_negative_and_idle() {
    let mut est = SpeedEstimator::new(RangingCfg {
        period_ms: 100,
        ..RangingCfg::default()
    });
    let out = feed(&mut est, &[900, 800, 700, 600, 500, 300]);
    assert_eq!(out.last().copied().flatten(), Some(-2.0));
    assert_eq!(est.band(), SpeedBand::Idle);
}

#[test]
fn vehicle_leaving_range_keeps_last_band() {
    let mut est = SpeedEstimator::new(RangingCfg::default());
    feed(&mut est, &[200, 300]);
    assert_eq!(est.band(), SpeedBand::Moderate);
    // 1200 is out of range: no new estimate, band and peak unchanged
    let out = feed(&mut est, &[1200]);
    assert_eq!(out, vec![None]);
    assert_eq!(est.band(), SpeedBand::Moderate);
    assert_eq!(est.peak_speed(), 1.0);
}

#[rstest]
#[case(&[100, 900], SpeedBand::Fast)]
#[case(&[100, 500], SpeedBand::Moderate)]
#[case(&[500, 500], SpeedBand::Idle)]
#[case(&[900, 100], SpeedBand::Idle)]
fn band_from_last_two_samples(#[case] samples: &[u16], #[case] want: SpeedBand) {
    let mut est = SpeedEstimator::new(RangingCfg::default());
    feed(&mut est, samples);
    assert_eq!(est.band(), want);
}

#[test]
fn peak_survives_slower_samples() {
    let mut est = SpeedEstimator::new(RangingCfg::default());
    feed(&mut est, &[100, 600, 650, 400]);
    assert_eq!(est.peak_speed(), 5.0);
    assert_eq!(est.last_speed(), Some(-2.5));
}

#[test]
fn two_cells_of_1000_weigh_2000() {
    let mut avg = WeightAverager::new(LinearCalibration::default());
    let mut outputs = Vec::new();
    for _ in 0..WEIGHT_WINDOW * 2 {
        if let Some(w) = avg.push_and_maybe_average([165, 165]) {
            outputs.push(w);
        }
    }
    assert_eq!(outputs, vec![2000.0, 2000.0]);
}

#[test]
fn command_sequence_changes_pin_twice() {
    let spy = SpyOutput::default();
    let mut barrier = BarrierController::new(spy.clone(), 11);
    let changes: Vec<_> = b"xoxc".iter().filter_map(|&b| barrier.handle_byte(b)).collect();
    assert_eq!(changes, vec![BarrierState::Open, BarrierState::Closed]);
    assert_eq!(barrier.state(), BarrierState::Closed);
    assert_eq!(spy.writes(), vec![(11, true), (11, false)]);
}

#[rstest]
#[case(b"o", BarrierState::Open)]
#[case(b"oc", BarrierState::Closed)]
#[case(b"cco", BarrierState::Open)]
#[case(b"\r\nO", BarrierState::Closed)]
fn last_command_wins(#[case] bytes: &[u8], #[case] want: BarrierState) {
    let mut barrier = BarrierController::new(SpyOutput::default(), 11);
    for &b in bytes {
        barrier.handle_byte(b);
    }
    assert_eq!(barrier.handle().state(), want);
}
