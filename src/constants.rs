//! Relay Node Constants
//!
//! Compiled-in defaults and validation bounds for every configurable field,
//! plus the identifiers used by the persisted settings namespace.

/// Firmware version reported by `AT+VERSION`
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Persisted key/value namespace holding the settings snapshot
pub const SETTINGS_NAMESPACE: &str = "relay_cfg";

/// Uptime after which the node performs a maintenance soft reset (12 h)
pub const RESET_INTERVAL_MS: u64 = 12 * 60 * 60 * 1000;

/// Main loop tick; must stay below the minimum beacon interval
pub const SCHEDULER_TICK_MS: u64 = 100;

/// SX126x reference crystal frequency
pub const XTAL_FREQ_HZ: u32 = 32_000_000;

// ----------------------------------------------------------------------------
// Radio-frequency group
// ----------------------------------------------------------------------------

pub const RF_FREQ_MIN: i64 = 863_000_000;
pub const RF_FREQ_MAX: i64 = 870_000_000;
pub const DEFAULT_RF_FREQUENCY: u32 = 865_000_000;

pub const TX_PWR_MIN: i64 = 2;
pub const TX_PWR_MAX: i64 = 22;
pub const DEFAULT_TX_OUTPUT_POWER: i8 = 20;

/// Bandwidth codes: 0 = 125 kHz, 1 = 250 kHz, 2 = 500 kHz
pub const BW_MIN: i64 = 0;
pub const BW_MAX: i64 = 2;
pub const DEFAULT_LORA_BANDWIDTH: u8 = 0;

pub const SF_MIN: i64 = 6;
pub const SF_MAX: i64 = 12;
pub const DEFAULT_LORA_SPREADING_FACTOR: u8 = 7;

/// Coding rate codes: 1 = 4/5 ... 4 = 4/8
pub const CR_MIN: i64 = 1;
pub const CR_MAX: i64 = 4;
pub const DEFAULT_LORA_CODING_RATE: u8 = 1;

pub const PREAMBLE_MIN: i64 = 4;
pub const PREAMBLE_MAX: i64 = 64;
pub const DEFAULT_LORA_PREAMBLE_LENGTH: u16 = 8;

pub const SYMBOL_TIMEOUT_MIN: i64 = 0;
pub const SYMBOL_TIMEOUT_MAX: i64 = 10_000;
pub const DEFAULT_LORA_SYMBOL_TIMEOUT: u16 = 0;

pub const DEFAULT_LORA_FIX_LENGTH_PAYLOAD: bool = false;
pub const DEFAULT_LORA_IQ_INVERSION: bool = false;

pub const TX_TIMEOUT_MIN: i64 = 10;
pub const TX_TIMEOUT_MAX: i64 = 60_000;
pub const DEFAULT_TX_TIMEOUT_MS: u32 = 1000;

// ----------------------------------------------------------------------------
// Listen-Before-Talk group
// ----------------------------------------------------------------------------

pub const LBT_RSSI_MIN: i64 = -120;
pub const LBT_RSSI_MAX: i64 = 0;
pub const DEFAULT_LBT_RSSI_THRESHOLD: i8 = -90;

pub const LBT_TIME_MIN: i64 = 10;
pub const LBT_TIME_MAX: i64 = 5000;
pub const DEFAULT_LBT_TIME_MS: u16 = 20;

pub const LBT_RETRY_MIN: i64 = 0;
pub const LBT_RETRY_MAX: i64 = 10;
pub const DEFAULT_LBT_RETRY: u8 = 5;

// ----------------------------------------------------------------------------
// Modbus-bridge group
// ----------------------------------------------------------------------------

pub const MODBUS_BAUD_MIN: i64 = 1200;
pub const MODBUS_BAUD_MAX: i64 = 115_200;
pub const DEFAULT_MODBUS_BAUDRATE: u32 = 9600;

pub const MODBUS_DELAY_MIN: i64 = 1;
pub const MODBUS_DELAY_MAX: i64 = 1000;
pub const DEFAULT_MODBUS_READ_DELAY_MS: u16 = 5;

pub const BUFFER_SIZE_MIN: i64 = 64;
pub const BUFFER_SIZE_MAX: i64 = 1024;
pub const DEFAULT_BUFFER_SIZE: u16 = 512;

// ----------------------------------------------------------------------------
// Operational group
// ----------------------------------------------------------------------------

pub const DEFAULT_DEBUG: bool = false;
pub const DEFAULT_BEACON_ENABLED: bool = false;

pub const BEACON_INTERVAL_MIN: i64 = 1000;
pub const BEACON_INTERVAL_MAX: i64 = 86_400_000;
pub const DEFAULT_BEACON_INTERVAL_MS: u32 = 5000;
