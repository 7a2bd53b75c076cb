//! Per-field validation rules.
//!
//! Every field of [`DeviceConfig`](super::DeviceConfig) has exactly one
//! [`FieldRule`] in [`FIELD_RULES`]. The same table drives command parsing,
//! persisted-value checking, status output and the persisted key layout.

use super::{FieldId, FieldValue};
use crate::constants::*;
use thiserror::Error;

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    I8,
    /// Accepts exactly `0` or `1`
    Bool,
}

/// Bound and naming metadata for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: FieldId,
    /// Persisted key, `None` for volatile fields
    pub key: Option<&'static str>,
    /// Key printed by `AT+STATUS`
    pub status_key: &'static str,
    /// Name used in error replies
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: i64,
    pub max: i64,
}

impl FieldRule {
    /// Inclusive bound check
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Input rejected by a field's rule. Carries enough to restate the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid {label} ({})", bound_text(.kind, .min, .max))]
pub struct RangeError {
    pub field: FieldId,
    pub label: &'static str,
    pub kind: FieldKind,
    pub min: i64,
    pub max: i64,
}

fn bound_text(kind: &FieldKind, min: &i64, max: &i64) -> String {
    match kind {
        FieldKind::Bool => "0|1".to_string(),
        _ => format!("{min}-{max}"),
    }
}

/// A value that has passed its field's rule. Only this module can build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated {
    field: FieldId,
    value: i64,
}

impl Validated {
    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

const fn field_rule(
    field: FieldId,
    key: Option<&'static str>,
    status_key: &'static str,
    label: &'static str,
    kind: FieldKind,
    min: i64,
    max: i64,
) -> FieldRule {
    FieldRule {
        field,
        key,
        status_key,
        label,
        kind,
        min,
        max,
    }
}

/// Rule table, indexed in [`FieldId`] declaration order
pub static FIELD_RULES: [FieldRule; 19] = [
    field_rule(
        FieldId::RfFrequency,
        Some("rf_freq"),
        "RF_FREQ",
        "RF frequency",
        FieldKind::U32,
        RF_FREQ_MIN,
        RF_FREQ_MAX,
    ),
    field_rule(
        FieldId::TxOutputPower,
        Some("tx_pwr"),
        "TX_POWER",
        "TX power",
        FieldKind::I8,
        TX_PWR_MIN,
        TX_PWR_MAX,
    ),
    field_rule(FieldId::LoraBandwidth, Some("lora_bw"), "BW", "BW", FieldKind::U8, BW_MIN, BW_MAX),
    field_rule(
        FieldId::LoraSpreadingFactor,
        Some("lora_sf"),
        "SF",
        "SF",
        FieldKind::U8,
        SF_MIN,
        SF_MAX,
    ),
    field_rule(FieldId::LoraCodingRate, Some("lora_cr"), "CR", "CR", FieldKind::U8, CR_MIN, CR_MAX),
    field_rule(
        FieldId::LoraPreambleLength,
        Some("lora_pre"),
        "PREAMBLE",
        "preamble length",
        FieldKind::U16,
        PREAMBLE_MIN,
        PREAMBLE_MAX,
    ),
    field_rule(
        FieldId::LoraSymbolTimeout,
        Some("lora_symto"),
        "SYMTIMEOUT",
        "symbol timeout",
        FieldKind::U16,
        SYMBOL_TIMEOUT_MIN,
        SYMBOL_TIMEOUT_MAX,
    ),
    field_rule(
        FieldId::LoraFixLengthPayload,
        Some("lora_fixlen"),
        "FIXLEN",
        "fixed length flag",
        FieldKind::Bool,
        0,
        1,
    ),
    field_rule(
        FieldId::LoraIqInversion,
        Some("lora_iqinv"),
        "IQINV",
        "IQ inversion flag",
        FieldKind::Bool,
        0,
        1,
    ),
    field_rule(
        FieldId::TxTimeout,
        Some("tx_timeout"),
        "TX_TIMEOUT",
        "TX timeout",
        FieldKind::U32,
        TX_TIMEOUT_MIN,
        TX_TIMEOUT_MAX,
    ),
    field_rule(
        FieldId::LbtRssiThreshold,
        Some("lbt_rssi"),
        "LBT_RSSI",
        "LBT RSSI threshold",
        FieldKind::I8,
        LBT_RSSI_MIN,
        LBT_RSSI_MAX,
    ),
    field_rule(
        FieldId::LbtTime,
        Some("lbt_time"),
        "LBT_TIME",
        "LBT time",
        FieldKind::U16,
        LBT_TIME_MIN,
        LBT_TIME_MAX,
    ),
    field_rule(
        FieldId::LbtRetry,
        Some("lbt_retry"),
        "LBT_RETRY",
        "LBT retry count",
        FieldKind::U8,
        LBT_RETRY_MIN,
        LBT_RETRY_MAX,
    ),
    field_rule(
        FieldId::ModbusBaudrate,
        Some("mb_baud"),
        "MODBUS_BAUD",
        "Modbus baud rate",
        FieldKind::U32,
        MODBUS_BAUD_MIN,
        MODBUS_BAUD_MAX,
    ),
    field_rule(
        FieldId::ModbusReadDelay,
        Some("mb_delay"),
        "MODBUS_DELAY",
        "Modbus delay",
        FieldKind::U16,
        MODBUS_DELAY_MIN,
        MODBUS_DELAY_MAX,
    ),
    field_rule(
        FieldId::BufferSize,
        Some("buf_size"),
        "BUFFER_SIZE",
        "buffer size",
        FieldKind::U16,
        BUFFER_SIZE_MIN,
        BUFFER_SIZE_MAX,
    ),
    field_rule(FieldId::Debug, None, "DEBUG", "debug flag", FieldKind::Bool, 0, 1),
    field_rule(
        FieldId::BeaconEnabled,
        Some("bcn_en"),
        "BEACON",
        "beacon param",
        FieldKind::Bool,
        0,
        1,
    ),
    field_rule(
        FieldId::BeaconInterval,
        Some("bcn_int"),
        "BEACON_INT",
        "beacon interval",
        FieldKind::U32,
        BEACON_INTERVAL_MIN,
        BEACON_INTERVAL_MAX,
    ),
];

/// Rule for `field`
pub fn rule(field: FieldId) -> &'static FieldRule {
    &FIELD_RULES[field as usize]
}

fn reject(rule: &FieldRule) -> RangeError {
    RangeError {
        field: rule.field,
        label: rule.label,
        kind: rule.kind,
        min: rule.min,
        max: rule.max,
    }
}

/// Validate a raw command token for `field`.
///
/// Integers are parsed as `i64`, so overflowing tokens fail to parse instead of
/// wrapping. Boolean fields accept only the literals `0` and `1`.
pub fn validate(field: FieldId, raw: &str) -> Result<Validated, RangeError> {
    let rule = rule(field);
    let raw = raw.trim();

    let value = match rule.kind {
        FieldKind::Bool => match raw {
            "0" => 0,
            "1" => 1,
            _ => return Err(reject(rule)),
        },
        _ => raw.parse::<i64>().map_err(|_| reject(rule))?,
    };

    if !rule.contains(value) {
        return Err(reject(rule));
    }
    Ok(Validated { field, value })
}

/// Check a typed value (e.g. one read back from storage) against `field`'s rule.
pub fn check(field: FieldId, value: FieldValue) -> Result<Validated, RangeError> {
    let rule = rule(field);
    if value.kind() != rule.kind || !rule.contains(value.as_i64()) {
        return Err(reject(rule));
    }
    Ok(Validated { field, value: value.as_i64() })
}
