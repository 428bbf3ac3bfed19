//! Driver assembly, monitor runs and the self-check.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use checkpoint_core::error::{MonitorError, Result as CoreResult};
use checkpoint_core::hw_error::map_hw_error;
use checkpoint_core::{LinearCalibration, MonitorBuilder, RunSummary, WeighingCfg, run_until};
use checkpoint_hardware::{StreamSerial, ThreadTimer};
use checkpoint_traits::clock::MonotonicClock;
use checkpoint_traits::{AnalogInput, DigitalOutput, RangeFinder};

use crate::rt::setup_rt_once;

/// Raw level of each simulated load cell, and the ripple around it.
const SIM_CELL_RAW: u16 = 330;
const SIM_CELL_RIPPLE: u16 = 33;

pub struct Drivers {
    pub ranger: Box<dyn RangeFinder + Send>,
    pub analog: Box<dyn AnalogInput + Send>,
    pub indicator: Box<dyn DigitalOutput + Send>,
    pub barrier: Box<dyn DigitalOutput + Send>,
    pub backend: &'static str,
}

fn simulated_load_cells(cfg: &checkpoint_config::Config) -> checkpoint_hardware::SimulatedLoadCells {
    let [a, b] = cfg.weighing.channels;
    checkpoint_hardware::SimulatedLoadCells::new()
        .with_channel(a, SIM_CELL_RAW)
        .with_channel(b, SIM_CELL_RAW)
        .with_ripple(SIM_CELL_RIPPLE)
}

/// Open the sensor and output drivers for the selected backend.
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open_drivers(cfg: &checkpoint_config::Config) -> CoreResult<Drivers> {
    use checkpoint_hardware::HardwareRanger;
    use checkpoint_hardware::hcsr04::GpioOutputs;

    let init = |what: &str, e: checkpoint_hardware::error::HwError| {
        eyre::Report::new(MonitorError::Init(format!("{what}: {e}")))
    };
    let ranger = HardwareRanger::new(
        cfg.pins.trigger,
        cfg.pins.echo,
        Duration::from_millis(cfg.hardware.sensor_read_timeout_ms),
    )
    .map_err(|e| init("open ranger pins", e))?;
    let indicator = GpioOutputs::new(&[cfg.pins.led_fast, cfg.pins.led_moderate, cfg.pins.led_idle])
        .map_err(|e| init("open indicator pins", e))?;
    let barrier =
        GpioOutputs::new(&[cfg.pins.barrier]).map_err(|e| init("open barrier pin", e))?;
    // No ADC driver yet: load cells stay simulated on hardware builds
    tracing::warn!("load cells are simulated on this build");
    Ok(Drivers {
        ranger: Box::new(ranger),
        analog: Box::new(simulated_load_cells(cfg)),
        indicator: Box::new(indicator),
        barrier: Box::new(barrier),
        backend: "hardware",
    })
}

/// Open the sensor and output drivers for the selected backend.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open_drivers(cfg: &checkpoint_config::Config) -> CoreResult<Drivers> {
    use checkpoint_hardware::{SimulatedOutputs, SimulatedRanger};

    Ok(Drivers {
        ranger: Box::new(SimulatedRanger::vehicle_pass()),
        analog: Box::new(simulated_load_cells(cfg)),
        indicator: Box::new(SimulatedOutputs::new()),
        barrier: Box::new(SimulatedOutputs::new()),
        backend: "sim",
    })
}

/// Start the monitor on stdio and supervise it until shutdown or `duration_ms`.
pub fn run_monitor(
    cfg: &checkpoint_config::Config,
    duration_ms: Option<u64>,
    rt: bool,
    rt_prio: Option<i32>,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary> {
    setup_rt_once(rt, rt_prio);

    let drivers = open_drivers(cfg)?;
    tracing::info!(backend = drivers.backend, "drivers ready");

    let monitor = MonitorBuilder::from_config(cfg)
        .with_ranger(drivers.ranger)
        .with_analog(drivers.analog)
        .with_indicator_output(drivers.indicator)
        .with_barrier_output(drivers.barrier)
        .with_serial(StreamSerial::stdio())
        .with_timer(ThreadTimer::new(MonotonicClock::new()))
        .start()?;

    run_until(monitor, &shutdown, duration_ms.map(Duration::from_millis))
}

/// One reading from every sensor.
#[derive(Debug, Clone)]
pub struct SelfCheckReport {
    pub backend: &'static str,
    pub distance_cm: u16,
    /// (channel, raw, converted weight)
    pub cells: Vec<(u8, u16, f32)>,
}

pub fn self_check(cfg: &checkpoint_config::Config) -> CoreResult<SelfCheckReport> {
    let mut drivers = open_drivers(cfg)?;

    let distance_cm = drivers.ranger.read_distance_cm().map_err(|e| {
        eyre::Report::new(map_hw_error(&*e)).wrap_err("range finder read failed")
    })?;

    let calibration: LinearCalibration = WeighingCfg::from(&cfg.weighing).calibration;
    let mut cells = Vec::with_capacity(2);
    for ch in cfg.weighing.channels {
        let raw = drivers.analog.read_channel(ch).map_err(|e| {
            eyre::Report::new(map_hw_error(&*e)).wrap_err(format!("load cell {ch} read failed"))
        })?;
        cells.push((ch, raw, calibration.to_physical(raw)));
    }

    // Leave the lane safe: barrier closed, indicator idle
    drivers
        .barrier
        .set_pin(cfg.pins.barrier, false)
        .map_err(|e| eyre::Report::new(MonitorError::Init(format!("barrier pin: {e}"))))?;

    Ok(SelfCheckReport {
        backend: drivers.backend,
        distance_cm,
        cells,
    })
}
