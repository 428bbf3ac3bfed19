use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("ranging echo timeout")]
    EchoTimeout,
    #[error("analog channel {0} is not configured")]
    UnknownChannel(u8),
    #[error("output pin {0} is not configured")]
    UnknownPin(u8),
    #[error("timer started before configure")]
    TimerNotConfigured,
    #[error("timer already started")]
    TimerAlreadyStarted,
    #[error("serial receive handler already registered")]
    HandlerAlreadyRegistered,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
impl From<rppal::gpio::Error> for HwError {
    fn from(e: rppal::gpio::Error) -> Self {
        HwError::Gpio(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HwError>;
