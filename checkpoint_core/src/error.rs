use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum MonitorError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("initialization failed: {0}")]
    Init(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing range finder")]
    MissingRanger,
    #[error("missing analog input")]
    MissingAnalog,
    #[error("missing indicator outputs")]
    MissingIndicator,
    #[error("missing barrier output")]
    MissingBarrierOutput,
    #[error("missing serial port")]
    MissingSerial,
    #[error("missing periodic timer")]
    MissingTimer,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
