use crate::barrier::BarrierState;
use crate::error::Result;
use crate::monitor::Monitor;
use crate::state::{HealthSnapshot, MonitorHealth, TelemetryRecord};
use crate::util::saturating_ms;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How often the supervising loop checks for shutdown and stalls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Compute the stall watchdog threshold in milliseconds.
///
/// Starts from four sensor timeouts, and never goes below two sampling
/// periods so a single missed sample does not trip it.
#[inline]
fn compute_stall_threshold_ms(sensor_timeout_ms: u64, period_ms: u64) -> u64 {
    std::cmp::max(fast_threshold_ms(sensor_timeout_ms), two_periods_ms(period_ms)).max(1)
}

/// Derive a quick stall threshold from per-read sensor timeout.
#[inline]
fn fast_threshold_ms(sensor_timeout_ms: u64) -> u64 {
    sensor_timeout_ms.saturating_mul(4)
}

/// Ensure the stall threshold spans at least two periods to tolerate one miss.
#[inline]
fn two_periods_ms(period_ms: u64) -> u64 {
    period_ms.saturating_mul(2)
}

#[inline]
fn stalled_now(elapsed_ms: u64, stalled_ms: u64, threshold_ms: u64) -> bool {
    elapsed_ms >= threshold_ms && stalled_ms > threshold_ms
}

/// Outcome of a supervised run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub elapsed_ms: u64,
    pub record: TelemetryRecord,
    pub barrier: BarrierState,
    pub health: MonitorHealth,
    /// Stall episodes detected across both sensors.
    pub stalls: u32,
}

/// Per-sensor stall tracking; warns once per episode.
struct StallWatch {
    name: &'static str,
    threshold_ms: u64,
    stalled: bool,
}

impl StallWatch {
    fn new(name: &'static str, threshold_ms: u64) -> Self {
        Self {
            name,
            threshold_ms,
            stalled: false,
        }
    }

    /// Returns true when a new stall episode begins.
    fn check(&mut self, now_ms: u64, health: &HealthSnapshot) -> bool {
        let stalled_ms = health.stalled_for(now_ms);
        let stalled = stalled_now(now_ms, stalled_ms, self.threshold_ms);
        let started = stalled && !self.stalled;
        if started {
            tracing::warn!(
                sensor = self.name,
                stalled_ms,
                threshold_ms = self.threshold_ms,
                failures = health.consecutive_failures,
                "sensor stalled"
            );
        } else if self.stalled && !stalled {
            tracing::info!(sensor = self.name, "sensor recovered");
        }
        self.stalled = stalled;
        started
    }
}

/// Supervise a running monitor until `shutdown` is set or `max_duration`
/// elapses, then stop it.
///
/// Sensor stalls are reported but never stop the monitor: the tasks keep
/// retrying and telemetry keeps reporting the last good values.
pub fn run_until(
    mut monitor: Monitor,
    shutdown: &AtomicBool,
    max_duration: Option<Duration>,
) -> Result<RunSummary> {
    let timeout_ms = monitor.sensor_timeout_ms();
    let mut ranging = StallWatch::new(
        "ranging",
        compute_stall_threshold_ms(timeout_ms, saturating_ms(monitor.ranging_period())),
    );
    let mut weighing = StallWatch::new(
        "weighing",
        compute_stall_threshold_ms(timeout_ms, saturating_ms(monitor.weighing_period())),
    );

    let start = Instant::now();
    let mut stalls = 0u32;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if let Some(max) = max_duration
            && start.elapsed() >= max
        {
            tracing::info!(max_ms = saturating_ms(max), "run duration reached");
            break;
        }

        let now_ms = monitor.uptime_ms();
        let health = monitor.health();
        stalls += u32::from(ranging.check(now_ms, &health.ranging));
        stalls += u32::from(weighing.check(now_ms, &health.weighing));

        if !monitor.is_running() {
            return Err(eyre::Report::new(crate::error::MonitorError::State(
                "monitor task exited unexpectedly".into(),
            )));
        }

        let slice = match max_duration {
            Some(max) => POLL_INTERVAL.min(max.saturating_sub(start.elapsed())),
            None => POLL_INTERVAL,
        };
        std::thread::sleep(slice);
    }

    let summary = RunSummary {
        elapsed_ms: saturating_ms(start.elapsed()),
        record: monitor.snapshot(),
        barrier: monitor.barrier_state(),
        health: monitor.health(),
        stalls,
    };
    monitor.shutdown();
    Ok(summary)
}
