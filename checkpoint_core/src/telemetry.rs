//! Periodic telemetry reporting over the serial link.

use checkpoint_traits::SerialPort;
use std::sync::Arc;

use crate::error::MonitorError;
use crate::hw_error::map_hw_error;
use crate::state::{SharedState, TelemetryRecord};

pub struct TelemetryReporter<S> {
    serial: S,
    state: Arc<SharedState>,
    sent: u64,
}

impl<S: SerialPort> TelemetryReporter<S> {
    pub fn new(serial: S, state: Arc<SharedState>) -> Self {
        Self {
            serial,
            state,
            sent: 0,
        }
    }

    /// Send one report built from a single consistent snapshot. Both lines
    /// go out in one transmission.
    pub fn report(&mut self) -> Result<TelemetryRecord, MonitorError> {
        let record = self.state.snapshot();
        self.serial
            .send_bytes(record.render().as_bytes())
            .map_err(|e| map_hw_error(&*e))?;
        self.sent += 1;
        tracing::trace!(
            weight = record.vehicle_weight,
            peak_speed = record.peak_speed,
            "telemetry"
        );
        Ok(record)
    }

    /// Reports sent successfully.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::CaptureSerial;

    #[test]
    fn report_sends_current_snapshot() {
        let state = Arc::new(SharedState::new());
        let serial = CaptureSerial::default();
        let mut rep = TelemetryReporter::new(serial.clone(), state.clone());

        rep.report().unwrap();
        state.publish_weight(2000.4);
        state.publish_peak_speed(5.0);
        rep.report().unwrap();

        let sent = serial.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], b"Peso:0\r\nVelocidad Maxima:0\r\n");
        assert_eq!(sent[1], b"Peso:2000\r\nVelocidad Maxima:5\r\n");
        assert_eq!(rep.sent(), 2);
    }
}
