//! # Relay Error Handling
//!
//! This module defines the RelayError enum, the crate-level error returned by
//! node boot and by the `relay` binary. Each subsystem keeps its own error
//! type; RelayError wraps them.

use crate::command::CommandError;
use crate::config::StorageError;
use crate::modbus::ModbusError;
use crate::radio::RadioError;
use thiserror::Error;

/// Represents the different error types that can occur in the relay crate.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The radio rejected its configuration.
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),

    /// Settings storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The Modbus serial link failed.
    #[error("Modbus error: {0}")]
    Modbus(#[from] ModbusError),

    /// An AT command failed.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Console or serial port I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates an error related to the console serial port.
    #[error("Serial port error: {0}")]
    SerialPort(String),
}
