//! Barrier actuator control from single-byte operator commands.
//!
//! `'o'` opens (actuator high), `'c'` closes (actuator low), every other byte
//! is ignored. The last command wins. The actuator line is written only on a
//! state change, and the handler never blocks, so it is safe to run from the
//! serial receive context.

use checkpoint_traits::DigitalOutput;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{MonitorError, Result};
use crate::hw_error::map_hw_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarrierState {
    Open,
    #[default]
    Closed,
}

impl BarrierState {
    fn from_open(open: bool) -> Self {
        if open {
            BarrierState::Open
        } else {
            BarrierState::Closed
        }
    }

    /// Actuator level for this state.
    pub fn level(self) -> bool {
        matches!(self, BarrierState::Open)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierCommand {
    Open,
    Close,
}

impl BarrierCommand {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'o' => Some(BarrierCommand::Open),
            b'c' => Some(BarrierCommand::Close),
            _ => None,
        }
    }

    pub fn target(self) -> BarrierState {
        match self {
            BarrierCommand::Open => BarrierState::Open,
            BarrierCommand::Close => BarrierState::Closed,
        }
    }
}

/// Read-only view of the barrier state, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct BarrierHandle {
    open: Arc<AtomicBool>,
}

impl BarrierHandle {
    pub fn state(&self) -> BarrierState {
        BarrierState::from_open(self.open.load(Ordering::Acquire))
    }
}

pub struct BarrierController<O> {
    output: O,
    pin: u8,
    handle: BarrierHandle,
}

impl<O: DigitalOutput> BarrierController<O> {
    /// New controller in the default Closed state. Call `init` to drive the
    /// actuator to match before accepting commands.
    pub fn new(output: O, pin: u8) -> Self {
        Self {
            output,
            pin,
            handle: BarrierHandle::default(),
        }
    }

    pub fn handle(&self) -> BarrierHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> BarrierState {
        self.handle.state()
    }

    /// Drive the actuator to the current state.
    pub fn init(&mut self) -> Result<()> {
        let level = self.state().level();
        self.output.set_pin(self.pin, level).map_err(|e| {
            eyre::Report::new(MonitorError::Init(format!(
                "barrier output pin {}: {}",
                self.pin,
                map_hw_error(&*e)
            )))
        })
    }

    /// Handle one received byte. Returns the new state if it changed.
    pub fn handle_byte(&mut self, byte: u8) -> Option<BarrierState> {
        match BarrierCommand::from_byte(byte) {
            Some(cmd) => self.apply(cmd),
            None => {
                tracing::trace!(byte, "ignored command byte");
                None
            }
        }
    }

    /// Apply a command. Returns the new state if it changed.
    ///
    /// If the actuator write fails the previous state is restored, so the
    /// reported state always matches the last level actually driven.
    pub fn apply(&mut self, cmd: BarrierCommand) -> Option<BarrierState> {
        let target = cmd.target();
        let was_open = self.handle.open.swap(target.level(), Ordering::AcqRel);
        if was_open == target.level() {
            return None;
        }
        match self.output.set_pin(self.pin, target.level()) {
            Ok(()) => {
                tracing::info!(state = ?target, "barrier");
                Some(target)
            }
            Err(e) => {
                self.handle.open.store(was_open, Ordering::Release);
                tracing::warn!(error = %map_hw_error(&*e), ?cmd, "barrier output failed");
                None
            }
        }
    }
}
