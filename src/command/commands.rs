//! Command table and interpreter
//!
//! Each AT command is a [`CommandDescriptor`] in [`COMMANDS`]. A line is
//! resolved by exact name equality, never by prefix, so `AT+` cannot shadow
//! `AT+SETRF=...`.
//!
//! [`interpret`] is pure: given the current configuration and a line it
//! returns the next configuration, the informational lines, and the
//! [`Effect`] the owner must carry out before replying `OK`.

use super::error::{CommandError, DispatchError};
use super::parser::parse_line;
use crate::config::{validate, DeviceConfig, FieldId};
use crate::constants::FIRMWARE_VERSION;

/// Argument shape of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Bare command, `=` not allowed
    None,
    /// `NAME=<value>`; the hint is shown by `AT+HELP`
    Value(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ping,
    Version,
    Status,
    Help,
    Set(FieldId),
    Beacon,
    Save,
    Apply,
    Load,
    Defaults,
}

/// Command descriptor
#[derive(Debug)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub arity: Arity,
    pub brief: &'static str,
    pub action: Action,
}

impl CommandDescriptor {
    /// `AT+HELP` line for this command
    pub fn usage(&self) -> String {
        match self.arity {
            Arity::None => format!("{} - {}", self.name, self.brief),
            Arity::Value(hint) => format!("{}={} - {}", self.name, hint, self.brief),
        }
    }
}

const fn cmd(
    name: &'static str,
    arity: Arity,
    brief: &'static str,
    action: Action,
) -> CommandDescriptor {
    CommandDescriptor {
        name,
        arity,
        brief,
        action,
    }
}

const fn set(
    name: &'static str,
    hint: &'static str,
    brief: &'static str,
    field: FieldId,
) -> CommandDescriptor {
    cmd(name, Arity::Value(hint), brief, Action::Set(field))
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    cmd("AT+", Arity::None, "Attention, replies OK", Action::Ping),
    cmd("AT+VERSION", Arity::None, "Firmware version", Action::Version),
    cmd("AT+STATUS", Arity::None, "Show all settings", Action::Status),
    cmd("AT+HELP", Arity::None, "List commands", Action::Help),
    set("AT+SETDEBUG", "0|1", "Debug output", FieldId::Debug),
    set("AT+SETRF", "<Hz>", "RF frequency, 863000000-870000000", FieldId::RfFrequency),
    set("AT+SETTXPWR", "<dBm>", "TX power, 2-22", FieldId::TxOutputPower),
    set("AT+SETSF", "<n>", "Spreading factor, 6-12", FieldId::LoraSpreadingFactor),
    set("AT+SETBW", "<code>", "Bandwidth, 0=125k 1=250k 2=500k", FieldId::LoraBandwidth),
    set("AT+SETCR", "<n>", "Coding rate 4/(n+4), 1-4", FieldId::LoraCodingRate),
    set("AT+SETPREAMBLE", "<n>", "Preamble length, 4-64", FieldId::LoraPreambleLength),
    set("AT+SETSYMTIMEOUT", "<n>", "RX symbol timeout, 0-10000", FieldId::LoraSymbolTimeout),
    set("AT+SETFIXLEN", "0|1", "Fixed-length payload", FieldId::LoraFixLengthPayload),
    set("AT+SETIQINV", "0|1", "IQ inversion", FieldId::LoraIqInversion),
    set("AT+SETTXTIMEOUT", "<ms>", "TX timeout, 10-60000", FieldId::TxTimeout),
    set("AT+SETLBT_RSSI", "<dBm>", "LBT RSSI threshold, -120-0", FieldId::LbtRssiThreshold),
    set("AT+SETLBT_TIME", "<ms>", "LBT listen time, 10-5000", FieldId::LbtTime),
    set("AT+SETLBT_RETRY", "<n>", "LBT retries, 0-10", FieldId::LbtRetry),
    set("AT+SETMODBUSBD", "<baud>", "Modbus baud rate, 1200-115200", FieldId::ModbusBaudrate),
    set("AT+SETMODBUSDELAY", "<ms>", "Modbus read delay, 1-1000", FieldId::ModbusReadDelay),
    cmd("AT+BEACON", Arity::Value("0|1"), "Disable/enable beacon", Action::Beacon),
    set("AT+SETBEACONINT", "<ms>", "Beacon interval, 1000-86400000", FieldId::BeaconInterval),
    cmd("AT+SAVE", Arity::None, "Persist settings", Action::Save),
    cmd("AT+LOAD", Arity::None, "Reload persisted settings", Action::Load),
    cmd("AT+DEFAULTS", Arity::None, "Restore compiled defaults (not saved)", Action::Defaults),
    cmd("AT+APPLY", Arity::None, "Re-apply settings to radio", Action::Apply),
];

/// Look a command up by exact name
pub fn find(name: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Get all command names
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|c| c.name)
}

/// Side effect the owner of the configuration performs after [`interpret`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Push the new configuration to the radio
    ApplyRadio,
    /// Bring the Modbus serial link in line with the new baud rate and delay
    SyncModbus,
    /// Persist the configuration
    Save,
    /// Replace the configuration with the persisted one, then reconfigure
    Reload,
    /// Apply radio and Modbus settings of the new configuration
    Reconfigure,
}

/// Result of interpreting one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub config: DeviceConfig,
    pub info: Vec<String>,
    pub effect: Effect,
}

impl Outcome {
    fn unchanged(config: &DeviceConfig, info: Vec<String>, effect: Effect) -> Self {
        Self {
            config: config.clone(),
            info,
            effect,
        }
    }
}

/// Resolve a line to its descriptor and checked argument
pub fn resolve(
    line: &str,
) -> Result<(&'static CommandDescriptor, Option<&str>), DispatchError> {
    let parsed = parse_line(line)?;
    let descriptor = find(parsed.name).ok_or(DispatchError::InvalidCommand)?;
    match descriptor.arity {
        Arity::None if parsed.arg.is_some() => Err(DispatchError::InvalidCommand),
        Arity::None => Ok((descriptor, None)),
        Arity::Value(_) => match parsed.arg.map(str::trim) {
            Some(arg) if !arg.is_empty() => Ok((descriptor, Some(arg))),
            _ => Err(DispatchError::MissingValue(descriptor.name)),
        },
    }
}

/// Interpret one line against `config`.
///
/// `config` is never modified; on error nothing changes.
pub fn interpret(
    config: &DeviceConfig,
    line: &str,
    now_ms: u64,
) -> Result<Outcome, CommandError> {
    let (descriptor, arg) = resolve(line)?;
    let arg = arg.unwrap_or_default();

    let outcome = match descriptor.action {
        Action::Ping => Outcome::unchanged(config, Vec::new(), Effect::None),
        Action::Version => Outcome::unchanged(
            config,
            vec![format!("VERSION:{FIRMWARE_VERSION}")],
            Effect::None,
        ),
        Action::Status => Outcome::unchanged(config, config.status_lines(), Effect::None),
        Action::Help => Outcome::unchanged(
            config,
            COMMANDS.iter().map(CommandDescriptor::usage).collect(),
            Effect::None,
        ),
        Action::Set(field) => {
            let value = validate(field, arg)?;
            let mut next = config.clone();
            next.set(value);
            let effect = if field.affects_radio() {
                Effect::ApplyRadio
            } else if matches!(field, FieldId::ModbusBaudrate | FieldId::ModbusReadDelay) {
                Effect::SyncModbus
            } else {
                Effect::None
            };
            Outcome {
                config: next,
                info: Vec::new(),
                effect,
            }
        }
        Action::Beacon => {
            let value = validate(FieldId::BeaconEnabled, arg)?;
            let mut next = config.clone();
            next.set(value);
            let info = if next.beacon_enabled {
                next.last_beacon_ms = now_ms;
                "Beacon enabled"
            } else {
                "Beacon disabled"
            };
            Outcome {
                config: next,
                info: vec![info.to_string()],
                effect: Effect::None,
            }
        }
        Action::Save => Outcome::unchanged(config, Vec::new(), Effect::Save),
        Action::Apply => Outcome::unchanged(config, Vec::new(), Effect::ApplyRadio),
        Action::Load => Outcome::unchanged(config, Vec::new(), Effect::Reload),
        Action::Defaults => Outcome {
            config: DeviceConfig {
                debug: config.debug,
                last_beacon_ms: config.last_beacon_ms,
                ..DeviceConfig::default()
            },
            info: Vec::new(),
            effect: Effect::Reconfigure,
        },
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_and_prefixed() {
        let mut seen = HashSet::new();
        for name in command_names() {
            assert!(name.starts_with("AT+"), "{name}");
            assert!(seen.insert(name), "duplicate {name}");
        }
    }

    #[test]
    fn test_every_settable_field_has_a_command() {
        for field in FieldId::ALL {
            let covered = COMMANDS.iter().any(|c| match c.action {
                Action::Set(f) => f == field,
                Action::Beacon => field == FieldId::BeaconEnabled,
                _ => false,
            });
            assert_eq!(covered, field != FieldId::BufferSize, "{field:?}");
        }
    }

    #[test]
    fn test_bare_prefix_does_not_shadow_setters() {
        let (descriptor, arg) = resolve("AT+SETRF=865000000").unwrap();
        assert_eq!(descriptor.name, "AT+SETRF");
        assert_eq!(arg, Some("865000000"));
        assert_eq!(resolve("AT+").unwrap().0.action, Action::Ping);
    }

    #[test]
    fn test_arity_checks() {
        assert_eq!(resolve("AT+STATUS=1").unwrap_err(), DispatchError::InvalidCommand);
        assert_eq!(resolve("AT+SETSF").unwrap_err(), DispatchError::MissingValue("AT+SETSF"));
        assert_eq!(resolve("AT+SETSF= ").unwrap_err(), DispatchError::MissingValue("AT+SETSF"));
        assert_eq!(resolve("AT+FOO").unwrap_err(), DispatchError::InvalidCommand);
        assert_eq!(resolve("AT+SETSFX=7").unwrap_err(), DispatchError::InvalidCommand);
    }

    #[test]
    fn test_set_effects() {
        let config = DeviceConfig::default();
        assert_eq!(interpret(&config, "AT+SETCR=2", 0).unwrap().effect, Effect::ApplyRadio);
        assert_eq!(interpret(&config, "AT+SETLBT_TIME=50", 0).unwrap().effect, Effect::None);
        assert_eq!(
            interpret(&config, "AT+SETMODBUSBD=19200", 0).unwrap().effect,
            Effect::SyncModbus
        );
        assert_eq!(
            interpret(&config, "AT+SETMODBUSDELAY=20", 0).unwrap().effect,
            Effect::SyncModbus
        );
    }

    #[test]
    fn test_range_error_message() {
        let err = interpret(&DeviceConfig::default(), "AT+SETSF=13", 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid SF (6-12)");
    }

    #[test]
    fn test_beacon_enable_resets_timer() {
        let config = DeviceConfig::default();
        let outcome = interpret(&config, "AT+BEACON=1", 7_000).unwrap();
        assert!(outcome.config.beacon_enabled);
        assert_eq!(outcome.config.last_beacon_ms, 7_000);
        assert_eq!(outcome.info, vec!["Beacon enabled"]);

        let off = interpret(&outcome.config, "AT+BEACON=0", 9_000).unwrap();
        assert!(!off.config.beacon_enabled);
        assert_eq!(off.config.last_beacon_ms, 7_000);
        assert_eq!(off.info, vec!["Beacon disabled"]);
    }

    #[test]
    fn test_beacon_param_error() {
        let err = interpret(&DeviceConfig::default(), "AT+BEACON=2", 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid beacon param (0|1)");
    }

    #[test]
    fn test_defaults_keep_volatile_fields() {
        let config = DeviceConfig {
            lora_spreading_factor: 12,
            debug: true,
            last_beacon_ms: 99,
            ..DeviceConfig::default()
        };
        let outcome = interpret(&config, "AT+DEFAULTS", 0).unwrap();
        assert_eq!(outcome.config.lora_spreading_factor, 7);
        assert!(outcome.config.debug);
        assert_eq!(outcome.config.last_beacon_ms, 99);
        assert_eq!(outcome.effect, Effect::Reconfigure);
    }

    #[test]
    fn test_help_lists_every_command() {
        let outcome = interpret(&DeviceConfig::default(), "AT+HELP", 0).unwrap();
        assert_eq!(outcome.info.len(), COMMANDS.len());
        assert!(outcome.info.contains(&"AT+SETSF=<n> - Spreading factor, 6-12".to_string()));
    }
}
