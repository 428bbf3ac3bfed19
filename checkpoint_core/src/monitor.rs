//! Monitor assembly and lifecycle.
//!
//! `MonitorBuilder` collects drivers and config; `start()` validates, brings
//! every output to its initial state, registers the command handler, spawns
//! the tasks and finally starts the timer. Any failure before the timer
//! starts is fatal and nothing is left running.

use std::sync::Arc;
use std::time::Duration;

use checkpoint_traits::clock::{Clock, MonotonicClock};
use checkpoint_traits::{AnalogInput, DigitalOutput, PeriodicTimer, RangeFinder, SerialPort};

use crate::barrier::{BarrierController, BarrierHandle, BarrierState};
use crate::config::{PinCfg, RangingCfg, TelemetryCfg, Timeouts, WeighingCfg};
use crate::error::{BuildError, MonitorError, Result};
use crate::hw_error::map_hw_error;
use crate::indicator::SpeedIndicator;
use crate::speed::{SpeedBand, SpeedEstimator};
use crate::state::{MonitorHealth, SharedState, TelemetryRecord};
use crate::tasks::{RangingTask, TaskHandle, TelemetryTask, WeighingTask};
use crate::telemetry::TelemetryReporter;
use crate::util::{period_from_ms, period_from_us};
use crate::wake::wake_channel;
use crate::weight::WeightAverager;

type BoxRanger = Box<dyn RangeFinder + Send>;
type BoxAnalog = Box<dyn AnalogInput + Send>;
type BoxOutput = Box<dyn DigitalOutput + Send>;
type BoxSerial = Box<dyn SerialPort + Send>;
type BoxTimer = Box<dyn PeriodicTimer + Send>;

fn invalid(msg: &'static str) -> Result<()> {
    Err(eyre::Report::new(BuildError::InvalidConfig(msg)))
}

fn init_err(what: &str, e: &(dyn std::error::Error + 'static)) -> eyre::Report {
    eyre::Report::new(MonitorError::Init(format!("{what}: {}", map_hw_error(e))))
}

/// Builder for `Monitor`. Every driver is required; config sections default.
#[derive(Default)]
pub struct MonitorBuilder {
    ranger: Option<BoxRanger>,
    analog: Option<BoxAnalog>,
    indicator: Option<BoxOutput>,
    barrier: Option<BoxOutput>,
    serial: Option<BoxSerial>,
    timer: Option<BoxTimer>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    ranging: RangingCfg,
    weighing: WeighingCfg,
    telemetry: TelemetryCfg,
    pins: PinCfg,
    timeouts: Timeouts,
}

impl MonitorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with every config section taken from a loaded file.
    pub fn from_config(cfg: &checkpoint_config::Config) -> Self {
        Self::default()
            .with_ranging((&cfg.ranging).into())
            .with_weighing((&cfg.weighing).into())
            .with_telemetry((&cfg.telemetry).into())
            .with_pins((&cfg.pins).into())
            .with_timeouts((&cfg.hardware).into())
    }

    pub fn with_ranger(mut self, r: impl RangeFinder + Send + 'static) -> Self {
        self.ranger = Some(Box::new(r));
        self
    }

    pub fn with_analog(mut self, a: impl AnalogInput + Send + 'static) -> Self {
        self.analog = Some(Box::new(a));
        self
    }

    /// Output bank driving the three indicator lights.
    pub fn with_indicator_output(mut self, o: impl DigitalOutput + Send + 'static) -> Self {
        self.indicator = Some(Box::new(o));
        self
    }

    pub fn with_barrier_output(mut self, o: impl DigitalOutput + Send + 'static) -> Self {
        self.barrier = Some(Box::new(o));
        self
    }

    pub fn with_serial(mut self, s: impl SerialPort + Send + 'static) -> Self {
        self.serial = Some(Box::new(s));
        self
    }

    pub fn with_timer(mut self, t: impl PeriodicTimer + Send + 'static) -> Self {
        self.timer = Some(Box::new(t));
        self
    }

    /// Clock pacing the ranging and telemetry tasks (default: monotonic).
    pub fn with_clock(mut self, c: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(c));
        self
    }

    pub fn with_ranging(mut self, c: RangingCfg) -> Self {
        self.ranging = c;
        self
    }

    pub fn with_weighing(mut self, c: WeighingCfg) -> Self {
        self.weighing = c;
        self
    }

    pub fn with_telemetry(mut self, c: TelemetryCfg) -> Self {
        self.telemetry = c;
        self
    }

    pub fn with_pins(mut self, c: PinCfg) -> Self {
        self.pins = c;
        self
    }

    pub fn with_timeouts(mut self, c: Timeouts) -> Self {
        self.timeouts = c;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.ranging.period_ms == 0 {
            return invalid("ranging period must be >= 1 ms");
        }
        if !(self.ranging.fast_speed.is_finite() && self.ranging.fast_speed > 0.0) {
            return invalid("fast speed threshold must be positive");
        }
        if self.weighing.timer_period_us == 0 {
            return invalid("timer period must be >= 1 us");
        }
        if self.weighing.channels[0] == self.weighing.channels[1] {
            return invalid("load-cell channels must differ");
        }
        if self.weighing.calibration.full_scale_raw == 0 {
            return invalid("calibration full-scale raw must be >= 1");
        }
        let w = self.weighing.calibration.full_scale_weight;
        if !(w.is_finite() && w > 0.0) {
            return invalid("calibration full-scale weight must be positive");
        }
        if self.telemetry.period_ms == 0 {
            return invalid("telemetry period must be >= 1 ms");
        }
        if self.timeouts.sensor_ms == 0 {
            return invalid("sensor_ms must be >= 1");
        }
        let p = &self.pins;
        let lines = [p.indicator.fast, p.indicator.moderate, p.indicator.idle, p.barrier];
        for (i, a) in lines.iter().enumerate() {
            if lines[i + 1..].contains(a) {
                return invalid("output pins must be distinct");
            }
        }
        Ok(())
    }

    /// Bring up the monitor.
    pub fn start(self) -> Result<Monitor> {
        self.validate()?;

        let ranger = self
            .ranger
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRanger))?;
        let analog = self
            .analog
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAnalog))?;
        let indicator_out = self
            .indicator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingIndicator))?;
        let barrier_out = self
            .barrier
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBarrierOutput))?;
        let mut serial = self
            .serial
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSerial))?;
        let mut timer = self
            .timer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTimer))?;
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        let state = Arc::new(SharedState::new());

        // Barrier closed, then commands may arrive
        let mut barrier = BarrierController::new(barrier_out, self.pins.barrier);
        barrier.init()?;
        let barrier_handle = barrier.handle();
        serial
            .register_receive_handler(Box::new(move |byte| {
                barrier.handle_byte(byte);
            }))
            .map_err(|e| init_err("serial receive handler", &*e))?;

        let mut indicator = SpeedIndicator::new(indicator_out, self.pins.indicator);
        indicator
            .show(SpeedBand::Idle)
            .map_err(|e| eyre::Report::new(MonitorError::Init(format!("indicator: {e}"))))?;

        let (notifier, wake) = wake_channel();
        timer
            .configure(
                self.weighing.timer_period_us,
                Box::new(move || {
                    notifier.notify();
                }),
            )
            .map_err(|e| init_err("timer configure", &*e))?;

        let ranging_period = period_from_ms(self.ranging.period_ms);
        let tasks = vec![
            TaskHandle::spawn_woken(
                WeighingTask::new(
                    analog,
                    self.weighing.channels,
                    WeightAverager::new(self.weighing.calibration),
                    state.clone(),
                ),
                wake,
            )?,
            TaskHandle::spawn_paced(
                RangingTask::new(
                    ranger,
                    SpeedEstimator::new(self.ranging.clone()),
                    indicator,
                    state.clone(),
                ),
                ranging_period,
                clock.clone(),
            )?,
            TaskHandle::spawn_paced(
                TelemetryTask::new(TelemetryReporter::new(serial, state.clone())),
                period_from_ms(self.telemetry.period_ms),
                clock,
            )?,
        ];

        // Dropping `tasks` on this error path joins the threads
        timer.start().map_err(|e| init_err("timer start", &*e))?;

        tracing::info!(
            ranging_ms = self.ranging.period_ms,
            timer_us = self.weighing.timer_period_us,
            telemetry_ms = self.telemetry.period_ms,
            "monitor started"
        );

        Ok(Monitor {
            state,
            barrier: barrier_handle,
            timer: Some(timer),
            tasks,
            sensor_timeout_ms: self.timeouts.sensor_ms,
            ranging_period,
            weighing_period: period_from_us(self.weighing.timer_period_us),
        })
    }
}

/// A running monitor. Dropping it stops the timer and joins every task.
pub struct Monitor {
    state: Arc<SharedState>,
    barrier: BarrierHandle,
    timer: Option<BoxTimer>,
    tasks: Vec<TaskHandle>,
    sensor_timeout_ms: u64,
    ranging_period: Duration,
    weighing_period: Duration,
}

impl core::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Monitor")
            .field("record", &self.snapshot())
            .field("barrier", &self.barrier_state())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// Consistent copy of the published telemetry values.
    pub fn snapshot(&self) -> TelemetryRecord {
        self.state.snapshot()
    }

    pub fn barrier_state(&self) -> BarrierState {
        self.barrier.state()
    }

    pub fn health(&self) -> MonitorHealth {
        MonitorHealth {
            ranging: self.state.ranging.snapshot(),
            weighing: self.state.weighing.snapshot(),
        }
    }

    /// Milliseconds since the monitor started.
    pub fn uptime_ms(&self) -> u64 {
        self.state.elapsed_ms()
    }

    /// Completed ticks per task, by task name.
    pub fn task_ticks(&self) -> Vec<(&'static str, u64)> {
        self.tasks.iter().map(|t| (t.name(), t.ticks())).collect()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some() && self.tasks.iter().all(|t| !t.is_finished())
    }

    pub fn sensor_timeout_ms(&self) -> u64 {
        self.sensor_timeout_ms
    }

    pub fn ranging_period(&self) -> Duration {
        self.ranging_period
    }

    pub fn weighing_period(&self) -> Duration {
        self.weighing_period
    }

    /// Stop the timer and join every task. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            if let Err(e) = timer.stop() {
                tracing::warn!(error = %map_hw_error(&*e), "timer stop failed");
            }
            self.tasks.clear();
            tracing::info!("monitor stopped");
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
