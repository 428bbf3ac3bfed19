//! Periodic timer backed by a dedicated thread.
//!
//! Stands in for the MCU hardware timer: after `start()`, the configured
//! callback fires once per period until `stop()` or drop.
use checkpoint_traits::clock::Clock;
use checkpoint_traits::{BoxError, PeriodicTimer, TimerCallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::HwError;

pub struct ThreadTimer<C: Clock + Clone + Send + 'static> {
    clock: C,
    period: Option<Duration>,
    callback: Option<TimerCallback>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl<C: Clock + Clone + Send + 'static> ThreadTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            period: None,
            callback: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            join_handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<C: Clock + Clone + Send + 'static> PeriodicTimer for ThreadTimer<C> {
    fn configure(&mut self, period_us: u64, callback: TimerCallback) -> Result<(), BoxError> {
        if self.join_handle.is_some() {
            return Err(Box::new(HwError::TimerAlreadyStarted));
        }
        self.period = Some(Duration::from_micros(period_us.max(1)));
        self.callback = Some(callback);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BoxError> {
        if self.join_handle.is_some() {
            return Err(Box::new(HwError::TimerAlreadyStarted));
        }
        let (Some(period), Some(mut callback)) = (self.period, self.callback.take()) else {
            return Err(Box::new(HwError::TimerNotConfigured));
        };
        let clock = self.clock.clone();
        let shutdown = self.shutdown.clone();
        let handle = std::thread::Builder::new()
            .name("periodic-timer".into())
            .spawn(move || {
                loop {
                    clock.sleep(period);
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    callback();
                }
                tracing::trace!("timer thread exiting cleanly");
            })
            .map_err(HwError::from)?;
        self.join_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("timer thread panicked during shutdown");
        }
        Ok(())
    }
}

impl<C: Clock + Clone + Send + 'static> Drop for ThreadTimer<C> {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
