//! # SX126x Radio Driver
//!
//! This module provides the LoRa subset of the Semtech SX126x command set
//! (SX1261, SX1262, SX1268) that the relay needs to (re)configure the radio:
//! standby, packet type, modulation and packet parameters, PA and TX power,
//! symbol timeout and RF frequency.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │   Radio Apply Bridge (bridge)   │
//! ├─────────────────────────────────┤
//! │     Sx126xDriver (this file)    │
//! ├─────────────────────────────────┤
//! │      HAL Abstraction Layer      │
//! ├─────────────────────────────────┤
//! │    Platform-specific HAL impl   │
//! └─────────────────────────────────┘
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use lora_relay::radio::driver::{Sx126xDriver, StandbyMode};
//! use lora_relay::radio::hal::LoggingHal;
//!
//! let mut driver = Sx126xDriver::new(LoggingHal::new(), 32_000_000);
//! driver.set_standby(StandbyMode::RC).unwrap();
//! driver.set_rf_frequency(865_000_000).unwrap();
//! ```

use crate::radio::hal::{Hal, HalError};
use crate::radio::modulation::{LoRaModParams, LoRaPacketParams};
use thiserror::Error;

/// SX126x opcodes used by this driver
pub mod opcodes {
    pub const SET_STANDBY: u8 = 0x80;
    pub const SET_RF_FREQUENCY: u8 = 0x86;
    pub const SET_PACKET_TYPE: u8 = 0x8A;
    pub const SET_MODULATION_PARAMS: u8 = 0x8B;
    pub const SET_PACKET_PARAMS: u8 = 0x8C;
    pub const SET_TX_PARAMS: u8 = 0x8E;
    pub const SET_BUFFER_BASE_ADDRESS: u8 = 0x8F;
    pub const SET_PA_CONFIG: u8 = 0x95;
    pub const SET_LORA_SYMB_NUM_TIMEOUT: u8 = 0xA0;
}

/// Register holding the LoRa symbol timeout mantissa/exponent
const REG_LORA_SYNCH_TIMEOUT: u16 = 0x0706;

/// Radio operating states based on SX126x chip modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    /// Device is in sleep mode (lowest power, ~160nA)
    Sleep = 0x0,
    /// Device is in standby mode using RC oscillator (~0.6mA)
    StandbyRc = 0x2,
    /// Device is in standby mode using crystal oscillator (~0.8mA)
    StandbyXosc = 0x3,
    /// Device is in receive mode
    Rx = 0x5,
    /// Device is in transmit mode
    Tx = 0x6,
}

impl RadioState {
    pub fn is_standby(self) -> bool {
        matches!(self, RadioState::StandbyRc | RadioState::StandbyXosc)
    }
}

/// Standby mode options for power management
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbyMode {
    /// Use 13MHz RC oscillator (faster wake-up, higher power)
    RC = 0x00,
    /// Use 32MHz crystal oscillator (slower wake-up, lower power)
    XOSC = 0x01,
}

/// Packet type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Gfsk = 0x00,
    LoRa = 0x01,
}

/// Errors that can occur during radio driver operations
#[derive(Error, Debug)]
pub enum RadioError {
    /// Hardware abstraction layer error (SPI, GPIO, etc.)
    #[error("HAL error: {0}")]
    Hal(HalError),
    /// Invalid configuration parameters provided
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    /// Radio is in wrong state for requested operation
    #[error("Wrong state: expected standby, got {actual:?}")]
    NotInStandby { actual: RadioState },
}

impl From<HalError> for RadioError {
    fn from(err: HalError) -> Self {
        RadioError::Hal(err)
    }
}

/// Main driver structure for SX126x radio transceivers
///
/// ## Type Parameters
///
/// * `H` - Hardware abstraction layer implementation that provides SPI access
pub struct Sx126xDriver<H: Hal> {
    hal: H,
    /// Crystal oscillator frequency in Hz (typically 32MHz)
    xtal_freq: u32,
    /// Tracked chip mode; parameter writes are only legal in standby
    state: RadioState,
    current_mod_params: Option<LoRaModParams>,
    current_packet_params: Option<LoRaPacketParams>,
    /// Last requested RF frequency in Hz
    current_freq_hz: Option<u32>,
    /// TX timeout used by the next SetTx, in milliseconds
    tx_timeout_ms: u32,
}

impl<H: Hal> Sx126xDriver<H> {
    /// Create a new SX126x driver instance
    ///
    /// # Arguments
    ///
    /// * `hal` - Hardware abstraction layer implementation
    /// * `xtal_freq` - Crystal oscillator frequency in Hz (typically 32_000_000)
    pub fn new(hal: H, xtal_freq: u32) -> Self {
        Self {
            hal,
            xtal_freq,
            state: RadioState::Sleep,
            current_mod_params: None,
            current_packet_params: None,
            current_freq_hz: None,
            tx_timeout_ms: 0,
        }
    }

    pub fn state(&self) -> RadioState {
        self.state
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn current_mod_params(&self) -> Option<LoRaModParams> {
        self.current_mod_params
    }

    pub fn current_packet_params(&self) -> Option<LoRaPacketParams> {
        self.current_packet_params
    }

    pub fn current_frequency(&self) -> Option<u32> {
        self.current_freq_hz
    }

    pub fn tx_timeout_ms(&self) -> u32 {
        self.tx_timeout_ms
    }

    pub(crate) fn set_tx_timeout_ms(&mut self, timeout_ms: u32) {
        self.tx_timeout_ms = timeout_ms;
    }

    fn require_standby(&self) -> Result<(), RadioError> {
        if self.state.is_standby() {
            Ok(())
        } else {
            Err(RadioError::NotInStandby { actual: self.state })
        }
    }

    /// Put the radio into standby. Always legal, from any state.
    pub fn set_standby(&mut self, mode: StandbyMode) -> Result<(), RadioError> {
        self.hal.write_command(opcodes::SET_STANDBY, &[mode as u8])?;
        self.state = match mode {
            StandbyMode::RC => RadioState::StandbyRc,
            StandbyMode::XOSC => RadioState::StandbyXosc,
        };
        log::debug!("Radio entered standby mode: {mode:?}");
        Ok(())
    }

    /// Set the RF carrier frequency
    ///
    /// Frequency resolution = Xtal_freq / 2^25
    pub fn set_rf_frequency(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        self.require_standby()?;
        let rf_freq = (frequency_hz as u64 * (1u64 << 25) / self.xtal_freq as u64) as u32;
        self.hal
            .write_command(opcodes::SET_RF_FREQUENCY, &rf_freq.to_be_bytes())?;
        self.current_freq_hz = Some(frequency_hz);
        Ok(())
    }

    /// Set packet type. Must precede modulation and packet parameters.
    pub fn set_packet_type(&mut self, packet_type: PacketType) -> Result<(), RadioError> {
        self.require_standby()?;
        self.hal
            .write_command(opcodes::SET_PACKET_TYPE, &[packet_type as u8])?;
        Ok(())
    }

    /// Configure LoRa modulation parameters
    pub fn set_modulation_params(&mut self, params: LoRaModParams) -> Result<(), RadioError> {
        self.require_standby()?;
        let buf = [
            params.sf as u8,
            params.bw as u8,
            params.cr as u8,
            u8::from(params.low_data_rate_optimize),
        ];
        self.hal.write_command(opcodes::SET_MODULATION_PARAMS, &buf)?;
        self.current_mod_params = Some(params);
        Ok(())
    }

    /// Configure LoRa packet parameters
    pub fn set_packet_params(&mut self, params: LoRaPacketParams) -> Result<(), RadioError> {
        self.require_standby()?;
        let [pre_msb, pre_lsb] = params.preamble_len.to_be_bytes();
        let buf = [
            pre_msb,
            pre_lsb,
            u8::from(params.implicit_header),
            params.payload_len,
            u8::from(params.crc_on),
            u8::from(params.iq_inverted),
        ];
        self.hal.write_command(opcodes::SET_PACKET_PARAMS, &buf)?;
        self.current_packet_params = Some(params);
        Ok(())
    }

    /// SetPaConfig: duty cycle, max HP size, device select, PA LUT (always 0x01)
    pub fn set_pa_config(
        &mut self,
        pa_duty_cycle: u8,
        hp_max: u8,
        device_sel: u8,
    ) -> Result<(), RadioError> {
        self.require_standby()?;
        self.hal
            .write_command(opcodes::SET_PA_CONFIG, &[pa_duty_cycle, hp_max, device_sel, 0x01])?;
        Ok(())
    }

    /// SetTxParams: output power in dBm (-9..=22 on the SX1262 high-power PA)
    pub fn set_tx_params(&mut self, power_dbm: i8, ramp_time: u8) -> Result<(), RadioError> {
        self.require_standby()?;
        if !(-9..=22).contains(&power_dbm) {
            return Err(RadioError::InvalidParams(format!(
                "TX power {power_dbm} dBm outside -9..=22"
            )));
        }
        self.hal
            .write_command(opcodes::SET_TX_PARAMS, &[power_dbm as u8, ramp_time])?;
        Ok(())
    }

    pub fn set_buffer_base_addresses(
        &mut self,
        tx_base: u8,
        rx_base: u8,
    ) -> Result<(), RadioError> {
        self.require_standby()?;
        self.hal
            .write_command(opcodes::SET_BUFFER_BASE_ADDRESS, &[tx_base, rx_base])?;
        Ok(())
    }

    /// Number of symbols the receiver waits for a preamble before timing out.
    ///
    /// The chip encodes the count as mantissa/exponent and caps it at 248.
    /// Zero disables the timeout (continuous search).
    pub fn set_lora_symb_num_timeout(&mut self, symbols: u16) -> Result<(), RadioError> {
        self.require_standby()?;
        let (mantissa, exponent) = encode_symbol_timeout(symbols);
        let command = mantissa << (2 * exponent + 1);
        self.hal
            .write_command(opcodes::SET_LORA_SYMB_NUM_TIMEOUT, &[command])?;
        if symbols != 0 {
            let reg = exponent + (mantissa << 3);
            self.hal.write_register(REG_LORA_SYNCH_TIMEOUT, &[reg])?;
        }
        Ok(())
    }
}

/// Mantissa/exponent encoding of a symbol timeout, saturating at 248 symbols
pub fn encode_symbol_timeout(symbols: u16) -> (u8, u8) {
    let capped = symbols.min(248) as u8;
    let mut mantissa = (capped + 1) >> 1;
    let mut exponent = 0u8;
    while mantissa > 31 {
        mantissa = (mantissa + 3) >> 2;
        exponent += 1;
    }
    (mantissa, exponent)
}
