//! Test and helper mocks for checkpoint_core

use checkpoint_traits::{
    AnalogInput, BoxError, DigitalOutput, PeriodicTimer, RangeFinder, ReceiveHandler, SerialPort,
    TimerCallback,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// Digital output that records every write. Clones share the record.
#[derive(Clone, Default)]
pub struct SpyOutput {
    writes: Arc<Mutex<Vec<(u8, bool)>>>,
    fail: bool,
}

impl SpyOutput {
    /// An output whose every write fails.
    pub fn failing() -> Self {
        Self {
            writes: Arc::default(),
            fail: true,
        }
    }

    pub fn writes(&self) -> Vec<(u8, bool)> {
        lock(&self.writes).clone()
    }

    /// Last level written to `pin`.
    pub fn level(&self, pin: u8) -> Option<bool> {
        lock(&self.writes)
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, l)| *l)
    }
}

impl DigitalOutput for SpyOutput {
    fn set_pin(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("output stuck")));
        }
        lock(&self.writes).push((pin, level));
        Ok(())
    }
}

/// Serial port that captures sent payloads and lets tests inject received
/// bytes through the registered handler.
#[derive(Clone, Default)]
pub struct CaptureSerial {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    handler: Arc<Mutex<Option<ReceiveHandler>>>,
}

impl CaptureSerial {
    /// Deliver one byte as if it arrived on the wire. Returns false if no
    /// handler is registered.
    pub fn inject(&self, byte: u8) -> bool {
        match lock(&self.handler).as_mut() {
            Some(h) => {
                h(byte);
                true
            }
            None => false,
        }
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }

    /// Everything sent so far, concatenated.
    pub fn sent_text(&self) -> String {
        let sent = lock(&self.sent);
        sent.iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl SerialPort for CaptureSerial {
    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), BoxError> {
        lock(&self.sent).push(payload.to_vec());
        Ok(())
    }

    fn register_receive_handler(&mut self, handler: ReceiveHandler) -> Result<(), BoxError> {
        *lock(&self.handler) = Some(handler);
        Ok(())
    }
}

/// Periodic timer fired by hand.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerState>>,
}

#[derive(Default)]
struct ManualTimerState {
    period_us: Option<u64>,
    callback: Option<TimerCallback>,
    running: bool,
}

impl ManualTimer {
    /// Invoke the callback once if the timer is running.
    pub fn fire(&self) -> bool {
        let mut st = lock(&self.inner);
        if !st.running {
            return false;
        }
        match st.callback.as_mut() {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }

    pub fn period_us(&self) -> Option<u64> {
        lock(&self.inner).period_us
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner).running
    }
}

impl PeriodicTimer for ManualTimer {
    fn configure(&mut self, period_us: u64, callback: TimerCallback) -> Result<(), BoxError> {
        let mut st = lock(&self.inner);
        st.period_us = Some(period_us);
        st.callback = Some(callback);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BoxError> {
        let mut st = lock(&self.inner);
        if st.callback.is_none() {
            return Err(Box::new(std::io::Error::other("timer not configured")));
        }
        st.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        lock(&self.inner).running = false;
        Ok(())
    }
}

/// Range finder replaying a fixed script, then repeating its last value.
pub struct ScriptedRanger {
    script: VecDeque<u16>,
    last: u16,
}

impl ScriptedRanger {
    pub fn new(script: impl IntoIterator<Item = u16>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: u16::MAX,
        }
    }
}

impl RangeFinder for ScriptedRanger {
    fn read_distance_cm(&mut self) -> Result<u16, BoxError> {
        if let Some(v) = self.script.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }
}

/// A range finder that always errors.
pub struct FailingRanger;

impl RangeFinder for FailingRanger {
    fn read_distance_cm(&mut self) -> Result<u16, BoxError> {
        Err(Box::new(std::io::Error::other("echo timeout")))
    }
}

/// Analog input returning a fixed raw value per channel; reads of
/// `fail_channel` error.
#[derive(Clone, Default)]
pub struct FixedAnalog {
    values: Vec<(u8, u16)>,
    fail_channel: Option<u8>,
}

impl FixedAnalog {
    pub fn new(values: &[(u8, u16)]) -> Self {
        Self {
            values: values.to_vec(),
            fail_channel: None,
        }
    }

    pub fn failing_on(mut self, channel: u8) -> Self {
        self.fail_channel = Some(channel);
        self
    }
}

impl AnalogInput for FixedAnalog {
    fn read_channel(&mut self, channel: u8) -> Result<u16, BoxError> {
        if self.fail_channel == Some(channel) {
            return Err(Box::new(std::io::Error::other("adc conversion failed")));
        }
        self.values
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| *v)
            .ok_or_else(|| -> BoxError { Box::new(std::io::Error::other("no such channel")) })
    }
}
