//! Command-level errors

use crate::config::{RangeError, StorageError};
use crate::modbus::ModbusError;
use crate::radio::RadioError;
use thiserror::Error;

/// The line does not name a command that can run as written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Unknown name, missing `AT+` prefix, or an argument on a bare command
    #[error("Invalid command")]
    InvalidCommand,

    #[error("Missing value for {0}")]
    MissingValue(&'static str),
}

/// Anything that makes a command reply `ERROR:`
///
/// The rendered text is what the operator sees after `ERROR: `. Lower-layer
/// detail stays available through `source()` for logging.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Radio apply failed")]
    Radio(#[from] RadioError),

    #[error("Save failed")]
    Storage(#[from] StorageError),

    #[error("Modbus baud change failed")]
    Modbus(#[from] ModbusError),
}

impl CommandError {
    /// Errors that leave nothing changed and need no log entry
    pub fn is_input_error(&self) -> bool {
        matches!(self, CommandError::Range(_) | CommandError::Dispatch(_))
    }
}
