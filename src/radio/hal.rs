//! # Hardware Abstraction Layer for Radio Hardware
//!
//! This module defines the HAL trait the SX126x driver talks through. SPI
//! transfer mechanics and GPIO reset sequencing live behind it, owned by the
//! platform.

use log::debug;
use thiserror::Error;

/// Errors that can occur during HAL operations
#[derive(Debug, Error)]
pub enum HalError {
    #[error("SPI communication error")]
    Spi,

    #[error("GPIO operation error")]
    Gpio,

    #[error("Register access error")]
    Register,

    #[error("Timeout waiting for operation")]
    Timeout,
}

/// Hardware Abstraction Layer trait for SX126x radio control
pub trait Hal {
    /// Write a command with optional data to the radio
    fn write_command(&mut self, opcode: u8, data: &[u8]) -> Result<(), HalError>;

    /// Write data to a radio register
    fn write_register(&mut self, addr: u16, data: &[u8]) -> Result<(), HalError>;
}

/// HAL for hosts without a radio attached: every SPI write is logged at
/// debug level.
#[derive(Debug, Default)]
pub struct LoggingHal {
    commands_sent: u64,
}

impl LoggingHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands and register writes issued so far
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }
}

impl Hal for LoggingHal {
    fn write_command(&mut self, opcode: u8, data: &[u8]) -> Result<(), HalError> {
        self.commands_sent += 1;
        debug!("SPI TX: {opcode:02X} {data:02X?}");
        Ok(())
    }

    fn write_register(&mut self, addr: u16, data: &[u8]) -> Result<(), HalError> {
        self.commands_sent += 1;
        debug!("SPI REG W: {addr:04X} {data:02X?}");
        Ok(())
    }
}
