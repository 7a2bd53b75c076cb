//! # Modbus Serial Port
//!
//! Opens the Modbus RS-485 side as an 8N1 `tokio_serial::SerialStream` and
//! keeps its baud rate and timing in step with the configuration through
//! [`SerialConfig::from_device_config`].

use super::{ModbusError, ModbusLink};
use crate::config::DeviceConfig;
use crate::constants::{DEFAULT_MODBUS_BAUDRATE, DEFAULT_MODBUS_READ_DELAY_MS};
use log::{debug, info};
use std::time::Duration;
use tokio_serial::{SerialPort, SerialPortBuilderExt};

/// Configuration for serial connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub baudrate: u32,
    /// Read timeout for one response
    pub timeout: Duration,
    /// Silence required between frames
    pub inter_frame_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: DEFAULT_MODBUS_BAUDRATE,
            timeout: Duration::from_secs(1),
            inter_frame_delay: Duration::from_millis(DEFAULT_MODBUS_READ_DELAY_MS as u64),
        }
    }
}

impl SerialConfig {
    /// Serial settings for the Modbus side of `config`.
    ///
    /// The response timeout grows at low rates: at least 100 ms plus the time
    /// to clock in a 256-byte frame (10 bits per byte).
    pub fn from_device_config(config: &DeviceConfig) -> Self {
        let frame_ms = 256 * 10 * 1000 / u64::from(config.modbus_baudrate.max(1));
        SerialConfig {
            baudrate: config.modbus_baudrate,
            timeout: Duration::from_millis(100 + frame_ms),
            inter_frame_delay: Duration::from_millis(u64::from(config.modbus_read_delay_ms)),
        }
    }
}

/// Modbus serial port handle
pub struct SerialModbusLink {
    port: tokio_serial::SerialStream,
    config: SerialConfig,
}

impl SerialModbusLink {
    /// Open `port_name` with 8 data bits, no parity, one stop bit.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(port_name: &str, config: SerialConfig) -> Result<Self, ModbusError> {
        let port = tokio_serial::new(port_name, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.timeout)
            .open_native_async()
            .map_err(|e| ModbusError::SerialPort(e.to_string()))?;
        info!("Modbus port {port_name} open at {} baud", config.baudrate);
        Ok(Self { port, config })
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }
}

impl ModbusLink for SerialModbusLink {
    fn baud_rate(&self) -> u32 {
        self.config.baudrate
    }

    fn set_baud_rate(&mut self, baud: u32) -> Result<(), ModbusError> {
        self.port
            .set_baud_rate(baud)
            .map_err(|e| ModbusError::SerialPort(e.to_string()))?;
        self.config.baudrate = baud;
        info!("Modbus baud rate set to {baud}");
        Ok(())
    }

    fn set_timing(
        &mut self,
        timeout: Duration,
        inter_frame_delay: Duration,
    ) -> Result<(), ModbusError> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| ModbusError::SerialPort(e.to_string()))?;
        self.config.timeout = timeout;
        self.config.inter_frame_delay = inter_frame_delay;
        debug!("Modbus timeout {timeout:?}, inter-frame delay {inter_frame_delay:?}");
        Ok(())
    }
}
