//! Serial transport over byte streams.
//!
//! On a host the "serial link" is the process's stdio: telemetry goes to the
//! writer, and a reader thread feeds every received byte to the registered
//! handler, playing the role of the UART receive interrupt.
use checkpoint_traits::{BoxError, ReceiveHandler, SerialPort};
use std::io::{Read, Write};

use crate::error::HwError;

pub struct StreamSerial<W, R> {
    writer: W,
    reader: Option<R>,
}

impl StreamSerial<std::io::Stdout, std::io::Stdin> {
    /// Telemetry on stdout, commands from stdin.
    pub fn stdio() -> Self {
        Self::new(std::io::stdout(), std::io::stdin())
    }
}

impl<W: Write, R: Read + Send + 'static> StreamSerial<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader: Some(reader),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write, R: Read + Send + 'static> SerialPort for StreamSerial<W, R> {
    fn send_bytes(&mut self, payload: &[u8]) -> Result<(), BoxError> {
        self.writer.write_all(payload).map_err(HwError::from)?;
        self.writer.flush().map_err(HwError::from)?;
        Ok(())
    }

    fn register_receive_handler(&mut self, mut handler: ReceiveHandler) -> Result<(), BoxError> {
        let mut reader = self.reader.take().ok_or(HwError::HandlerAlreadyRegistered)?;
        std::thread::Builder::new()
            .name("serial-rx".into())
            .spawn(move || {
                let mut byte = [0u8; 1];
                loop {
                    match reader.read(&mut byte) {
                        Ok(0) => {
                            tracing::debug!("serial input closed");
                            break;
                        }
                        Ok(_) => handler(byte[0]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            tracing::warn!(error = %e, "serial read failed, receiver stopped");
                            break;
                        }
                    }
                }
            })
            .map_err(HwError::from)?;
        // Blocking stdin reads cannot be interrupted, so the receiver is
        // detached and ends with the process or at EOF.
        Ok(())
    }
}
