//! # Modbus Serial Link
//!
//! The relay's Modbus side is a serial port whose line settings follow the
//! configuration. Framing and polling happen elsewhere; this module only
//! keeps the port's baud rate and timing in step with `modbus_baudrate` and
//! `modbus_read_delay_ms`.

pub mod serial;
pub mod serial_mock;

use std::time::Duration;
use thiserror::Error;

pub use serial::{SerialConfig, SerialModbusLink};
pub use serial_mock::{MockModbusLink, MockSerialPort};

#[derive(Debug, Error)]
pub enum ModbusError {
    /// Opening or reconfiguring the serial port failed
    #[error("Serial port error: {0}")]
    SerialPort(String),
}

/// A serial link whose baud rate can be switched at runtime
pub trait ModbusLink: Send {
    /// Current line speed
    fn baud_rate(&self) -> u32;

    /// Reconfigure the line speed in place
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ModbusError>;

    /// Set the response timeout and the silence kept between frames
    fn set_timing(
        &mut self,
        _timeout: Duration,
        _inter_frame_delay: Duration,
    ) -> Result<(), ModbusError> {
        Ok(())
    }
}

impl<L: ModbusLink + ?Sized> ModbusLink for Box<L> {
    fn baud_rate(&self) -> u32 {
        (**self).baud_rate()
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ModbusError> {
        (**self).set_baud_rate(baud)
    }

    fn set_timing(
        &mut self,
        timeout: Duration,
        inter_frame_delay: Duration,
    ) -> Result<(), ModbusError> {
        (**self).set_timing(timeout, inter_frame_delay)
    }
}

/// Link used when no Modbus port is attached; it just remembers the rate.
#[derive(Debug, Clone)]
pub struct NullModbusLink {
    baud: u32,
}

impl NullModbusLink {
    pub fn new(baud: u32) -> Self {
        Self { baud }
    }
}

impl ModbusLink for NullModbusLink {
    fn baud_rate(&self) -> u32 {
        self.baud
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ModbusError> {
        log::debug!("No Modbus port attached, recording baud rate {baud}");
        self.baud = baud;
        Ok(())
    }
}
