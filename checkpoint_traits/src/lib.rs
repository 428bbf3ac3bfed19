//! Collaborator interfaces consumed by the checkpoint monitor.
//!
//! Drivers for the ranging sensor, load-cell ADC, digital outputs, serial
//! link and periodic timer live outside the core; the core only talks to
//! them through these traits.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type returned across the driver boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked once per received serial byte, from the transport's
/// receive context. Must return quickly and never block.
pub type ReceiveHandler = Box<dyn FnMut(u8) + Send + 'static>;

/// Callback invoked at every timer period expiry.
pub type TimerCallback = Box<dyn FnMut() + Send + 'static>;

/// Ultrasonic ranging driver.
pub trait RangeFinder {
    /// Take one distance measurement in centimeters. Bounded latency.
    fn read_distance_cm(&mut self) -> Result<u16, BoxError>;
}

/// Analog-input driver.
pub trait AnalogInput {
    /// Read one raw sample from `channel`.
    fn read_channel(&mut self, channel: u8) -> Result<u16, BoxError>;
}

/// Digital-output driver addressing logical pins.
pub trait DigitalOutput {
    fn set_pin(&mut self, pin: u8, level: bool) -> Result<(), BoxError>;
}

/// Byte-oriented serial transport.
pub trait SerialPort {
    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), BoxError>;

    /// Register the handler that receives every incoming byte. Called once
    /// during startup, before any task runs.
    fn register_receive_handler(&mut self, handler: ReceiveHandler) -> Result<(), BoxError>;
}

/// Hardware periodic timer.
pub trait PeriodicTimer {
    fn configure(&mut self, period_us: u64, callback: TimerCallback) -> Result<(), BoxError>;
    fn start(&mut self) -> Result<(), BoxError>;

    /// Stop firing. Timers that cannot be stopped may keep the default.
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T: RangeFinder + ?Sized> RangeFinder for Box<T> {
    fn read_distance_cm(&mut self) -> Result<u16, BoxError> {
        (**self).read_distance_cm()
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_channel(&mut self, channel: u8) -> Result<u16, BoxError> {
        (**self).read_channel(channel)
    }
}

impl<T: DigitalOutput + ?Sized> DigitalOutput for Box<T> {
    fn set_pin(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        (**self).set_pin(pin, level)
    }
}

impl<T: SerialPort + ?Sized> SerialPort for Box<T> {
    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), BoxError> {
        (**self).send_bytes(payload)
    }

    fn register_receive_handler(&mut self, handler: ReceiveHandler) -> Result<(), BoxError> {
        (**self).register_receive_handler(handler)
    }
}

impl<T: PeriodicTimer + ?Sized> PeriodicTimer for Box<T> {
    fn configure(&mut self, period_us: u64, callback: TimerCallback) -> Result<(), BoxError> {
        (**self).configure(period_us, callback)
    }

    fn start(&mut self) -> Result<(), BoxError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
}
