#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core checkpoint monitor logic (hardware-agnostic).
//!
//! The monitor watches one lane of a weigh-and-speed checkpoint. All hardware
//! goes through the driver traits in `checkpoint_traits`.
//!
//! ## Architecture
//!
//! - **Ranging task** (`tasks::RangingTask`): paced distance sampling into a
//!   10-sample window, speed estimate from the two newest samples, peak speed
//!   and the three-light indicator.
//! - **Weighing task** (`tasks::WeighingTask`): woken by the periodic timer
//!   through a single-slot wake channel (`wake`); averages 50-sample windows
//!   of both load cells into the vehicle weight.
//! - **Telemetry task** (`tasks::TelemetryTask`): paced report of a
//!   consistent snapshot (`state::SharedState`) over the serial link.
//! - **Barrier** (`barrier`): single-byte commands from the serial receive
//!   context open and close the barrier.
//!
//! `MonitorBuilder::start` assembles and starts everything; `runner::run_until`
//! supervises a running monitor with a stall watchdog.

pub mod barrier;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod indicator;
pub mod mocks;
pub mod monitor;
pub mod runner;
pub mod speed;
pub mod state;
pub mod tasks;
pub mod telemetry;
pub mod util;
pub mod wake;
pub mod weight;
pub mod window;

pub use barrier::{BarrierCommand, BarrierController, BarrierHandle, BarrierState};
pub use calibration::LinearCalibration;
pub use config::{IndicatorPins, PinCfg, RangingCfg, TelemetryCfg, Timeouts, WeighingCfg};
pub use error::{BuildError, MonitorError, Report, Result};
pub use monitor::{Monitor, MonitorBuilder};
pub use runner::{RunSummary, run_until};
pub use speed::{DISTANCE_WINDOW, SpeedBand, SpeedEstimator};
pub use state::{HealthSnapshot, MonitorHealth, TelemetryRecord};
pub use weight::{WEIGHT_WINDOW, WeightAverager};
pub use window::SampleWindow;
