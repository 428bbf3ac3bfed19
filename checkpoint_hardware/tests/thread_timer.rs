use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use checkpoint_hardware::ThreadTimer;
use checkpoint_traits::{MonotonicClock, PeriodicTimer};
use rstest::rstest;

#[rstest]
fn fires_repeatedly_until_stopped() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticks_cb = ticks.clone();
    let mut timer = ThreadTimer::new(MonotonicClock::new());
    timer
        .configure(
            2_000,
            Box::new(move || {
                ticks_cb.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();
    timer.start().unwrap();
    assert!(timer.is_running());

    std::thread::sleep(Duration::from_millis(60));
    timer.stop().unwrap();
    let after_stop = ticks.load(Ordering::Relaxed);
    assert!(after_stop >= 3, "only {after_stop} ticks in 60ms at 2ms period");

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(ticks.load(Ordering::Relaxed), after_stop);
    assert!(!timer.is_running());
}

#[rstest]
fn start_without_configure_fails() {
    let mut timer = ThreadTimer::new(MonotonicClock::new());
    let err = timer.start().unwrap_err();
    assert!(err.to_string().contains("configure"));
}

#[rstest]
fn double_start_fails() {
    let mut timer = ThreadTimer::new(MonotonicClock::new());
    timer.configure(10_000, Box::new(|| {})).unwrap();
    timer.start().unwrap();
    let err = timer.start().unwrap_err();
    assert!(err.to_string().contains("already started"));
}

#[rstest]
fn drop_stops_thread_promptly() {
    let mut timer = ThreadTimer::new(MonotonicClock::new());
    timer.configure(5_000, Box::new(|| {})).unwrap();
    timer.start().unwrap();
    let t0 = std::time::Instant::now();
    drop(timer);
    assert!(t0.elapsed() < Duration::from_millis(200));
}
