//! End-to-end monitor runs against mock drivers on real threads.

use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use checkpoint_core::error::{BuildError, MonitorError};
use checkpoint_core::mocks::{
    CaptureSerial, FailingRanger, FixedAnalog, ManualTimer, ScriptedRanger, SpyOutput,
};
use checkpoint_core::{
    BarrierState, LinearCalibration, MonitorBuilder, RangingCfg, TelemetryCfg, WEIGHT_WINDOW,
    WeighingCfg, run_until,
};
use rstest::rstest;

const BARRIER: u8 = 11;
const LED_FAST: u8 = 22;
const LED_IDLE: u8 = 24;

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

struct Rig {
    indicator: SpyOutput,
    barrier: SpyOutput,
    serial: CaptureSerial,
    timer: ManualTimer,
}

impl Rig {
    fn new() -> Self {
        Self {
            indicator: SpyOutput::default(),
            barrier: SpyOutput::default(),
            serial: CaptureSerial::default(),
            timer: ManualTimer::default(),
        }
    }

    fn builder(&self) -> MonitorBuilder {
        MonitorBuilder::new()
            .with_ranger(ScriptedRanger::new([1200]))
            .with_analog(FixedAnalog::new(&[(1, 165), (2, 165)]))
            .with_indicator_output(self.indicator.clone())
            .with_barrier_output(self.barrier.clone())
            .with_serial(self.serial.clone())
            .with_timer(self.timer.clone())
            .with_ranging(RangingCfg {
                period_ms: 10,
                ..RangingCfg::default()
            })
            .with_telemetry(TelemetryCfg { period_ms: 10 })
    }
}

#[test]
fn startup_closes_barrier_and_lights_idle() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    assert_eq!(rig.barrier.writes(), vec![(BARRIER, false)]);
    assert_eq!(rig.indicator.level(LED_IDLE), Some(true));
    assert_eq!(rig.timer.period_us(), Some(5000));
    assert!(rig.timer.is_running());
    assert_eq!(monitor.barrier_state(), BarrierState::Closed);
}

#[test]
fn serial_commands_drive_barrier() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    for b in *b"xoxc" {
        assert!(rig.serial.inject(b));
    }
    assert_eq!(monitor.barrier_state(), BarrierState::Closed);
    // startup write plus exactly two changes
    assert_eq!(
        rig.barrier.writes(),
        vec![(BARRIER, false), (BARRIER, true), (BARRIER, false)]
    );

    rig.serial.inject(b'o');
    assert_eq!(monitor.barrier_state(), BarrierState::Open);
}

#[test]
fn timer_wakes_produce_weight() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    let weighing_ticks = || {
        monitor
            .task_ticks()
            .into_iter()
            .find(|(n, _)| *n == "weighing")
            .map_or(0, |(_, t)| t)
    };

    for i in 1..=WEIGHT_WINDOW as u64 {
        assert!(rig.timer.fire());
        // one sample per wake: wait for it before firing again
        assert!(wait_until(Duration::from_secs(2), || weighing_ticks() >= i));
    }
    assert_eq!(monitor.snapshot().vehicle_weight, 2000.0);
    assert_eq!(monitor.health().weighing.total_failures, 0);
}

#[test]
fn telemetry_reports_published_values() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || rig
        .serial
        .sent_text()
        .contains("Peso:0\r\nVelocidad Maxima:0\r\n")));

    for _ in 0..WEIGHT_WINDOW {
        rig.timer.fire();
        std::thread::sleep(Duration::from_millis(1));
    }
    // coalesced wakes may need extra fires to complete the window
    assert!(wait_until(Duration::from_secs(2), || {
        rig.timer.fire();
        monitor.snapshot().vehicle_weight == 2000.0
    }));
    assert!(wait_until(Duration::from_secs(2), || rig
        .serial
        .sent_text()
        .contains("Peso:2000\r\n")));
    // every report is exactly the two-line record
    for payload in rig.serial.sent() {
        let text = String::from_utf8(payload).unwrap();
        assert!(text.starts_with("Peso:"));
        assert!(text.ends_with("\r\n"));
        assert_eq!(text.matches("\r\n").count(), 2);
    }
}

#[test]
fn receding_vehicle_sets_peak_and_fast_light() {
    let rig = Rig::new();
    let monitor = rig
        .builder()
        .with_ranger(ScriptedRanger::new([100, 600]))
        .start()
        .unwrap();
    // Δt = 10 ms: (600 - 100) / 10 = 50
    assert!(wait_until(Duration::from_secs(2), || monitor
        .snapshot()
        .peak_speed
        == 50.0));
    // the ranger then holds at 600 (speed 0), so the fast light is transient
    assert!(wait_until(Duration::from_secs(2), || rig
        .indicator
        .writes()
        .contains(&(LED_FAST, true))));
    assert!(wait_until(Duration::from_secs(2), || rig
        .indicator
        .level(LED_IDLE)
        == Some(true)));
    assert_eq!(monitor.snapshot().peak_speed, 50.0);
}

#[test]
fn failing_ranger_keeps_monitor_running() {
    let rig = Rig::new();
    let monitor = rig.builder().with_ranger(FailingRanger).start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || monitor
        .health()
        .ranging
        .consecutive_failures
        >= 3));
    assert!(monitor.is_running());
    assert_eq!(monitor.health().ranging.last_ok_ms, None);
    assert_eq!(monitor.snapshot().peak_speed, 0.0);
}

#[test]
fn shutdown_stops_timer_and_is_idempotent() {
    let rig = Rig::new();
    let mut monitor = rig.builder().start().unwrap();
    monitor.shutdown();
    assert!(!rig.timer.is_running());
    assert!(!monitor.is_running());
    monitor.shutdown();
}

#[test]
fn missing_driver_is_typed_build_error() {
    let rig = Rig::new();
    let err = MonitorBuilder::new()
        .with_ranger(FailingRanger)
        .with_analog(FixedAnalog::default())
        .with_indicator_output(rig.indicator.clone())
        .with_barrier_output(rig.barrier.clone())
        .with_timer(rig.timer.clone())
        .start()
        .expect_err("serial is missing");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSerial) => {}
        other => panic!("expected MissingSerial, got: {other:?}"),
    }
}

#[test]
fn invalid_config_rejected_before_any_output() {
    let rig = Rig::new();
    let err = rig
        .builder()
        .with_ranging(RangingCfg {
            period_ms: 0,
            ..RangingCfg::default()
        })
        .start()
        .expect_err("zero period");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
    assert!(rig.barrier.writes().is_empty());
}

#[rstest]
#[case(f32::NAN)]
#[case(f32::INFINITY)]
#[case(0.0)]
#[case(-5.0)]
fn unusable_full_scale_weight_is_rejected(#[case] weight: f32) {
    let rig = Rig::new();
    let err = rig
        .builder()
        .with_weighing(WeighingCfg {
            calibration: LinearCalibration {
                full_scale_weight: weight,
                ..LinearCalibration::default()
            },
            ..WeighingCfg::default()
        })
        .start()
        .expect_err("bad full-scale weight");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(msg)) if msg.contains("full-scale weight")
    ));
    assert!(rig.barrier.writes().is_empty());
}

#[test]
fn stuck_barrier_output_aborts_startup() {
    let rig = Rig::new();
    let err = rig
        .builder()
        .with_barrier_output(SpyOutput::failing())
        .start()
        .expect_err("barrier init fails");
    assert!(matches!(
        err.downcast_ref::<MonitorError>(),
        Some(MonitorError::Init(_))
    ));
    assert!(!rig.timer.is_running());
}

#[test]
fn run_until_stops_after_duration() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    rig.serial.inject(b'o');
    let shutdown = AtomicBool::new(false);
    let summary = run_until(monitor, &shutdown, Some(Duration::from_millis(60))).unwrap();
    assert!(summary.elapsed_ms >= 60);
    assert_eq!(summary.barrier, BarrierState::Open);
    assert!(!rig.timer.is_running());
}

#[test]
fn run_until_honours_shutdown_flag() {
    let rig = Rig::new();
    let monitor = rig.builder().start().unwrap();
    let shutdown = AtomicBool::new(true);
    let summary = run_until(monitor, &shutdown, None).unwrap();
    assert!(summary.elapsed_ms < 1000);
}
