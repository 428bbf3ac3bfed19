//! State shared between the monitor tasks.
//!
//! The published telemetry values live behind one mutex so a reader always
//! sees a consistent pair. Sensor health is lock-free.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// The values reported on the telemetry link.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryRecord {
    /// Latest vehicle weight; 0 until the first weight window completes.
    pub vehicle_weight: f32,
    /// Highest speed seen since start.
    pub peak_speed: f32,
}

impl TelemetryRecord {
    /// Wire form: two CRLF-terminated lines, values truncated toward zero.
    pub fn render(&self) -> String {
        format!(
            "Peso:{}\r\nVelocidad Maxima:{}\r\n",
            truncate(self.vehicle_weight),
            truncate(self.peak_speed)
        )
    }
}

fn truncate(v: f32) -> i64 {
    // float-to-int `as` saturates and maps NaN to 0
    v.trunc() as i64
}

#[derive(Debug)]
pub struct SharedState {
    record: Mutex<TelemetryRecord>,
    epoch: Instant,
    pub ranging: SensorHealth,
    pub weighing: SensorHealth,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            record: Mutex::new(TelemetryRecord::default()),
            epoch: Instant::now(),
            ranging: SensorHealth::default(),
            weighing: SensorHealth::default(),
        }
    }

    fn with_record<R>(&self, f: impl FnOnce(&mut TelemetryRecord) -> R) -> R {
        // A panicking writer cannot leave a torn record: both fields are Copy
        // and written in one assignment each.
        let mut guard = self.record.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }

    pub fn publish_weight(&self, weight: f32) {
        self.with_record(|r| r.vehicle_weight = weight);
    }

    pub fn publish_peak_speed(&self, peak: f32) {
        self.with_record(|r| r.peak_speed = peak);
    }

    pub fn snapshot(&self) -> TelemetryRecord {
        self.with_record(|r| *r)
    }

    /// Milliseconds since this state was created.
    pub fn elapsed_ms(&self) -> u64 {
        let ms = self.epoch.elapsed().as_millis();
        (ms.min(u128::from(u64::MAX))) as u64
    }
}

const NEVER: u64 = u64::MAX;

/// Read-success bookkeeping for one sensor.
#[derive(Debug)]
pub struct SensorHealth {
    last_ok_ms: AtomicU64,
    consecutive_failures: AtomicU64,
    total_failures: AtomicU64,
}

impl Default for SensorHealth {
    fn default() -> Self {
        Self {
            last_ok_ms: AtomicU64::new(NEVER),
            consecutive_failures: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
        }
    }
}

impl SensorHealth {
    pub fn record_ok(&self, now_ms: u64) {
        self.last_ok_ms.store(now_ms, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Returns the consecutive failure count including this one.
    pub fn record_failure(&self) -> u64 {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last = self.last_ok_ms.load(Ordering::Relaxed);
        HealthSnapshot {
            last_ok_ms: (last != NEVER).then_some(last),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HealthSnapshot {
    /// Time of the last successful read, ms since monitor start.
    pub last_ok_ms: Option<u64>,
    pub consecutive_failures: u64,
    pub total_failures: u64,
}

impl HealthSnapshot {
    /// Milliseconds since the last successful read, measured from start if
    /// there never was one.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok_ms.unwrap_or(0))
    }
}

/// Health of both sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorHealth {
    pub ranging: HealthSnapshot,
    pub weighing: HealthSnapshot,
}
