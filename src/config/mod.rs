//! # Relay Node Configuration
//!
//! This module holds [`DeviceConfig`], the single source of truth for every
//! setting of the relay node, grouped by subsystem:
//!
//! - **Radio**: frequency, TX power, bandwidth, spreading factor, coding rate,
//!   preamble, symbol timeout, fixed-length payload, IQ inversion, TX timeout
//! - **Listen-Before-Talk**: RSSI threshold, listen time, retry count
//! - **Modbus bridge**: baud rate, inter-frame read delay, buffer size
//! - **Operational**: debug output, beacon enable/interval, last beacon time
//!
//! Mutation goes exclusively through [`DeviceConfig::set`], which only accepts
//! a [`Validated`] value produced by the [`validator`]. That keeps every live
//! value inside its declared bound.
//!
//! ## Usage
//!
//! ```rust
//! use lora_relay::config::{validator, DeviceConfig, FieldId};
//!
//! let mut config = DeviceConfig::default();
//! let value = validator::validate(FieldId::LoraSpreadingFactor, "9").unwrap();
//! config.set(value);
//! assert_eq!(config.lora_spreading_factor, 9);
//! ```

pub mod storage;
pub mod store;
pub mod validator;

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use storage::{JsonFileStorage, MemoryStorage, Namespace, OpenMode, Storage, StorageError};
pub use store::{load_config, save_config, LoadReport};
pub use validator::{validate, FieldKind, FieldRule, RangeError, Validated};

/// Identifies one user-visible, validated field of [`DeviceConfig`].
///
/// `last_beacon_ms` has no entry: it is bookkeeping owned by the
/// beacon scheduler, not a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    RfFrequency,
    TxOutputPower,
    LoraBandwidth,
    LoraSpreadingFactor,
    LoraCodingRate,
    LoraPreambleLength,
    LoraSymbolTimeout,
    LoraFixLengthPayload,
    LoraIqInversion,
    TxTimeout,
    LbtRssiThreshold,
    LbtTime,
    LbtRetry,
    ModbusBaudrate,
    ModbusReadDelay,
    BufferSize,
    Debug,
    BeaconEnabled,
    BeaconInterval,
}

impl FieldId {
    /// Every field, in status-report order
    pub const ALL: [FieldId; 19] = [
        FieldId::RfFrequency,
        FieldId::TxOutputPower,
        FieldId::LoraBandwidth,
        FieldId::LoraSpreadingFactor,
        FieldId::LoraCodingRate,
        FieldId::LoraPreambleLength,
        FieldId::LoraSymbolTimeout,
        FieldId::LoraFixLengthPayload,
        FieldId::LoraIqInversion,
        FieldId::TxTimeout,
        FieldId::LbtRssiThreshold,
        FieldId::LbtTime,
        FieldId::LbtRetry,
        FieldId::ModbusBaudrate,
        FieldId::ModbusReadDelay,
        FieldId::BufferSize,
        FieldId::Debug,
        FieldId::BeaconEnabled,
        FieldId::BeaconInterval,
    ];

    /// Validation rule for this field
    pub fn rule(self) -> &'static FieldRule {
        validator::rule(self)
    }

    /// Key in the persisted namespace, `None` for volatile fields
    pub fn persist_key(self) -> Option<&'static str> {
        self.rule().key
    }

    /// Whether a change to this field must be pushed to the radio
    pub fn affects_radio(self) -> bool {
        matches!(
            self,
            FieldId::RfFrequency
                | FieldId::TxOutputPower
                | FieldId::LoraBandwidth
                | FieldId::LoraSpreadingFactor
                | FieldId::LoraCodingRate
                | FieldId::LoraPreambleLength
                | FieldId::LoraSymbolTimeout
                | FieldId::LoraFixLengthPayload
                | FieldId::LoraIqInversion
                | FieldId::TxTimeout
        )
    }
}

/// A typed field value, as reported by `AT+STATUS` and kept in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    Bool(bool),
}

impl FieldValue {
    /// Widen to `i64` for range checks
    pub fn as_i64(self) -> i64 {
        match self {
            FieldValue::U8(v) => v as i64,
            FieldValue::U16(v) => v as i64,
            FieldValue::U32(v) => v as i64,
            FieldValue::I8(v) => v as i64,
            FieldValue::Bool(v) => v as i64,
        }
    }

    /// Storage kind of this value
    pub fn kind(self) -> FieldKind {
        match self {
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::U16(_) => FieldKind::U16,
            FieldValue::U32(_) => FieldKind::U32,
            FieldValue::I8(_) => FieldKind::I8,
            FieldValue::Bool(_) => FieldKind::Bool,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{}", u8::from(*v)),
            other => write!(f, "{}", other.as_i64()),
        }
    }
}

/// Complete settings record of the relay node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    // Radio
    pub rf_frequency: u32,
    pub tx_output_power: i8,
    pub lora_bandwidth: u8,
    pub lora_spreading_factor: u8,
    pub lora_coding_rate: u8,
    pub lora_preamble_length: u16,
    pub lora_symbol_timeout: u16,
    pub lora_fix_length_payload: bool,
    pub lora_iq_inversion: bool,
    pub tx_timeout_ms: u32,

    // Listen-Before-Talk
    pub lbt_rssi_threshold: i8,
    pub lbt_time_ms: u16,
    pub lbt_retry: u8,

    // Modbus
    pub modbus_baudrate: u32,
    pub modbus_read_delay_ms: u16,
    pub buffer_size: u16,

    // Operational
    /// Volatile, never persisted
    pub debug: bool,
    pub beacon_enabled: bool,
    pub beacon_interval_ms: u32,
    /// Volatile, reset to "now" on boot
    pub last_beacon_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            rf_frequency: DEFAULT_RF_FREQUENCY,
            tx_output_power: DEFAULT_TX_OUTPUT_POWER,
            lora_bandwidth: DEFAULT_LORA_BANDWIDTH,
            lora_spreading_factor: DEFAULT_LORA_SPREADING_FACTOR,
            lora_coding_rate: DEFAULT_LORA_CODING_RATE,
            lora_preamble_length: DEFAULT_LORA_PREAMBLE_LENGTH,
            lora_symbol_timeout: DEFAULT_LORA_SYMBOL_TIMEOUT,
            lora_fix_length_payload: DEFAULT_LORA_FIX_LENGTH_PAYLOAD,
            lora_iq_inversion: DEFAULT_LORA_IQ_INVERSION,
            tx_timeout_ms: DEFAULT_TX_TIMEOUT_MS,
            lbt_rssi_threshold: DEFAULT_LBT_RSSI_THRESHOLD,
            lbt_time_ms: DEFAULT_LBT_TIME_MS,
            lbt_retry: DEFAULT_LBT_RETRY,
            modbus_baudrate: DEFAULT_MODBUS_BAUDRATE,
            modbus_read_delay_ms: DEFAULT_MODBUS_READ_DELAY_MS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            debug: DEFAULT_DEBUG,
            beacon_enabled: DEFAULT_BEACON_ENABLED,
            beacon_interval_ms: DEFAULT_BEACON_INTERVAL_MS,
            last_beacon_ms: 0,
        }
    }
}

impl DeviceConfig {
    /// Read a field as a typed value
    pub fn get(&self, field: FieldId) -> FieldValue {
        match field {
            FieldId::RfFrequency => FieldValue::U32(self.rf_frequency),
            FieldId::TxOutputPower => FieldValue::I8(self.tx_output_power),
            FieldId::LoraBandwidth => FieldValue::U8(self.lora_bandwidth),
            FieldId::LoraSpreadingFactor => FieldValue::U8(self.lora_spreading_factor),
            FieldId::LoraCodingRate => FieldValue::U8(self.lora_coding_rate),
            FieldId::LoraPreambleLength => FieldValue::U16(self.lora_preamble_length),
            FieldId::LoraSymbolTimeout => FieldValue::U16(self.lora_symbol_timeout),
            FieldId::LoraFixLengthPayload => FieldValue::Bool(self.lora_fix_length_payload),
            FieldId::LoraIqInversion => FieldValue::Bool(self.lora_iq_inversion),
            FieldId::TxTimeout => FieldValue::U32(self.tx_timeout_ms),
            FieldId::LbtRssiThreshold => FieldValue::I8(self.lbt_rssi_threshold),
            FieldId::LbtTime => FieldValue::U16(self.lbt_time_ms),
            FieldId::LbtRetry => FieldValue::U8(self.lbt_retry),
            FieldId::ModbusBaudrate => FieldValue::U32(self.modbus_baudrate),
            FieldId::ModbusReadDelay => FieldValue::U16(self.modbus_read_delay_ms),
            FieldId::BufferSize => FieldValue::U16(self.buffer_size),
            FieldId::Debug => FieldValue::Bool(self.debug),
            FieldId::BeaconEnabled => FieldValue::Bool(self.beacon_enabled),
            FieldId::BeaconInterval => FieldValue::U32(self.beacon_interval_ms),
        }
    }

    /// Write a validated value into its field.
    ///
    /// The narrowing casts are lossless: [`Validated`] can only be built by the
    /// validator, which has already checked the value against the field's bound,
    /// and every bound fits the field's storage type.
    pub fn set(&mut self, value: Validated) {
        let v = value.value();
        match value.field() {
            FieldId::RfFrequency => self.rf_frequency = v as u32,
            FieldId::TxOutputPower => self.tx_output_power = v as i8,
            FieldId::LoraBandwidth => self.lora_bandwidth = v as u8,
            FieldId::LoraSpreadingFactor => self.lora_spreading_factor = v as u8,
            FieldId::LoraCodingRate => self.lora_coding_rate = v as u8,
            FieldId::LoraPreambleLength => self.lora_preamble_length = v as u16,
            FieldId::LoraSymbolTimeout => self.lora_symbol_timeout = v as u16,
            FieldId::LoraFixLengthPayload => self.lora_fix_length_payload = v != 0,
            FieldId::LoraIqInversion => self.lora_iq_inversion = v != 0,
            FieldId::TxTimeout => self.tx_timeout_ms = v as u32,
            FieldId::LbtRssiThreshold => self.lbt_rssi_threshold = v as i8,
            FieldId::LbtTime => self.lbt_time_ms = v as u16,
            FieldId::LbtRetry => self.lbt_retry = v as u8,
            FieldId::ModbusBaudrate => self.modbus_baudrate = v as u32,
            FieldId::ModbusReadDelay => self.modbus_read_delay_ms = v as u16,
            FieldId::BufferSize => self.buffer_size = v as u16,
            FieldId::Debug => self.debug = v != 0,
            FieldId::BeaconEnabled => self.beacon_enabled = v != 0,
            FieldId::BeaconInterval => self.beacon_interval_ms = v as u32,
        }
    }

    /// Reset the two volatile fields, as done on every boot and reload
    pub fn reset_volatile(&mut self, now_ms: u64) {
        self.debug = false;
        self.last_beacon_ms = now_ms;
    }

    /// `KEY=value` lines for every field, in [`FieldId::ALL`] order
    pub fn status_lines(&self) -> Vec<String> {
        FieldId::ALL
            .iter()
            .map(|&field| format!("{}={}", field.rule().status_key, self.get(field)))
            .collect()
    }
}
