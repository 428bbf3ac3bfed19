//! Single-slot wake signal from the periodic timer to the weighing task.
//!
//! Notifying never blocks, so it is safe from the timer's interrupt-like
//! context. Notifications that arrive while one is already pending coalesce
//! into that one.

use crossbeam_channel as xch;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Notified,
    TimedOut,
    /// Every notifier was dropped.
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct WakeNotifier {
    tx: xch::Sender<()>,
}

#[derive(Debug)]
pub struct WakeReceiver {
    rx: xch::Receiver<()>,
}

pub fn wake_channel() -> (WakeNotifier, WakeReceiver) {
    let (tx, rx) = xch::bounded(1);
    (WakeNotifier { tx }, WakeReceiver { rx })
}

impl WakeNotifier {
    /// Returns false if a notification was already pending or the receiver
    /// is gone.
    pub fn notify(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

impl WakeReceiver {
    pub fn wait_timeout(&self, timeout: Duration) -> Wake {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Wake::Notified,
            Err(xch::RecvTimeoutError::Timeout) => Wake::TimedOut,
            Err(xch::RecvTimeoutError::Disconnected) => Wake::Disconnected,
        }
    }
}
