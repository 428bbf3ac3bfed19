//! Background monitor tasks.
//!
//! Each task owns its drivers and runs on its own thread. Paced tasks tick
//! once per period; woken tasks tick once per timer notification. Every
//! `TaskHandle` owns exactly one thread, which is signalled and joined when
//! the handle is dropped.

use checkpoint_traits::clock::Clock;
use checkpoint_traits::{AnalogInput, DigitalOutput, RangeFinder, SerialPort};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::hw_error::map_hw_error;
use crate::indicator::SpeedIndicator;
use crate::speed::SpeedEstimator;
use crate::state::{SensorHealth, SharedState};
use crate::telemetry::TelemetryReporter;
use crate::util::MAX_SLEEP_SLICE;
use crate::wake::{Wake, WakeReceiver};
use crate::weight::WeightAverager;

/// Consecutive failures between repeated warnings for a failing sensor.
const WARN_EVERY: u64 = 50;

/// One unit of periodic work.
pub trait PeriodicTask: Send + 'static {
    fn name(&self) -> &'static str;
    fn tick(&mut self);
}

pub struct TaskHandle {
    name: &'static str,
    ticks: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl TaskHandle {
    /// Run `task` every `period`, measured with `clock`.
    pub fn spawn_paced<T: PeriodicTask>(
        mut task: T,
        period: Duration,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        Self::spawn(task.name(), move |shutdown, ticks| {
            while !shutdown.load(Ordering::Relaxed) {
                task.tick();
                ticks.fetch_add(1, Ordering::Relaxed);

                // Sleep in slices so shutdown is seen promptly
                let mut remaining = period;
                while !remaining.is_zero() && !shutdown.load(Ordering::Relaxed) {
                    let slice = remaining.min(MAX_SLEEP_SLICE);
                    clock.sleep(slice);
                    remaining = remaining.saturating_sub(slice);
                }
            }
        })
    }

    /// Run `task` once per wake notification.
    pub fn spawn_woken<T: PeriodicTask>(mut task: T, wake: WakeReceiver) -> Result<Self> {
        Self::spawn(task.name(), move |shutdown, ticks| {
            while !shutdown.load(Ordering::Relaxed) {
                match wake.wait_timeout(MAX_SLEEP_SLICE) {
                    Wake::Notified => {
                        task.tick();
                        ticks.fetch_add(1, Ordering::Relaxed);
                    }
                    Wake::TimedOut => {}
                    Wake::Disconnected => {
                        tracing::debug!("wake source gone, exiting task");
                        break;
                    }
                }
            }
        })
    }

    fn spawn(
        name: &'static str,
        body: impl FnOnce(&AtomicBool, &AtomicU64) + Send + 'static,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let ticks = Arc::new(AtomicU64::new(0));
        let (shutdown_t, ticks_t) = (shutdown.clone(), ticks.clone());
        let join_handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                body(&shutdown_t, &ticks_t);
                tracing::trace!(task = name, "task thread exiting cleanly");
            })
            .map_err(|e| {
                eyre::Report::new(MonitorError::Init(format!("spawn {name} task: {e}")))
            })?;
        tracing::debug!(task = name, "task started");
        Ok(Self {
            name,
            ticks,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Completed ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(std::thread::JoinHandle::is_finished)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Exits within one sleep slice, or after the current tick's driver
        // call returns (bounded by the sensor timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!(task = self.name, "task joined"),
                Err(e) => tracing::warn!(task = self.name, ?e, "task panicked during shutdown"),
            }
        }
    }
}

/// Log a read failure on the first occurrence and every `WARN_EVERY` after.
fn note_failure(health: &SensorHealth, task: &'static str, err: &MonitorError) {
    let n = health.record_failure();
    if n == 1 || n % WARN_EVERY == 0 {
        tracing::warn!(task, consecutive = n, error = %err, "sensor read failed");
    }
}

// ── Ranging ──────────────────────────────────────────────────────────────────

/// Samples distance, updates the speed estimate and drives the indicator.
pub struct RangingTask<R, O> {
    ranger: R,
    estimator: SpeedEstimator,
    indicator: SpeedIndicator<O>,
    state: Arc<SharedState>,
}

impl<R, O> RangingTask<R, O>
where
    R: RangeFinder + Send + 'static,
    O: DigitalOutput + Send + 'static,
{
    pub fn new(
        ranger: R,
        estimator: SpeedEstimator,
        indicator: SpeedIndicator<O>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            ranger,
            estimator,
            indicator,
            state,
        }
    }

    pub fn estimator(&self) -> &SpeedEstimator {
        &self.estimator
    }
}

impl<R, O> PeriodicTask for RangingTask<R, O>
where
    R: RangeFinder + Send + 'static,
    O: DigitalOutput + Send + 'static,
{
    fn name(&self) -> &'static str {
        "ranging"
    }

    fn tick(&mut self) {
        match self.ranger.read_distance_cm() {
            Ok(cm) => {
                self.state.ranging.record_ok(self.state.elapsed_ms());
                self.estimator.push_sample(cm);
                if let Some(speed) = self.estimator.estimate_speed() {
                    tracing::trace!(cm, speed, "speed estimate");
                    self.state.publish_peak_speed(self.estimator.peak_speed());
                }
            }
            Err(e) => note_failure(&self.state.ranging, self.name(), &map_hw_error(&*e)),
        }
        if let Err(e) = self.indicator.show(self.estimator.band()) {
            tracing::warn!(error = %e, "indicator output failed");
        }
    }
}

// ── Weighing ─────────────────────────────────────────────────────────────────

/// Samples both load cells once per timer wake and publishes the weight.
pub struct WeighingTask<A> {
    analog: A,
    channels: [u8; 2],
    averager: WeightAverager,
    state: Arc<SharedState>,
}

impl<A: AnalogInput + Send + 'static> WeighingTask<A> {
    pub fn new(
        analog: A,
        channels: [u8; 2],
        averager: WeightAverager,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            analog,
            channels,
            averager,
            state,
        }
    }

    /// Read both channels. Either failing discards the pair so the two
    /// windows stay in step.
    fn sample_channels(&mut self) -> std::result::Result<[u16; 2], MonitorError> {
        let a = self
            .analog
            .read_channel(self.channels[0])
            .map_err(|e| map_hw_error(&*e))?;
        let b = self
            .analog
            .read_channel(self.channels[1])
            .map_err(|e| map_hw_error(&*e))?;
        Ok([a, b])
    }
}

impl<A: AnalogInput + Send + 'static> PeriodicTask for WeighingTask<A> {
    fn name(&self) -> &'static str {
        "weighing"
    }

    fn tick(&mut self) {
        match self.sample_channels() {
            Ok(raw) => {
                self.state.weighing.record_ok(self.state.elapsed_ms());
                if let Some(weight) = self.averager.push_and_maybe_average(raw) {
                    tracing::debug!(weight, "vehicle weight");
                    self.state.publish_weight(weight);
                }
            }
            Err(e) => note_failure(&self.state.weighing, self.name(), &e),
        }
    }
}

// ── Telemetry ────────────────────────────────────────────────────────────────

pub struct TelemetryTask<S> {
    reporter: TelemetryReporter<S>,
    failures: u64,
}

impl<S: SerialPort + Send + 'static> TelemetryTask<S> {
    pub fn new(reporter: TelemetryReporter<S>) -> Self {
        Self {
            reporter,
            failures: 0,
        }
    }
}

impl<S: SerialPort + Send + 'static> PeriodicTask for TelemetryTask<S> {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn tick(&mut self) {
        match self.reporter.report() {
            Ok(_) => self.failures = 0,
            Err(e) => {
                self.failures += 1;
                if self.failures == 1 || self.failures % WARN_EVERY == 0 {
                    tracing::warn!(consecutive = self.failures, error = %e, "telemetry send failed");
                }
            }
        }
    }
}
