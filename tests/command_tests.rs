//! End-to-end AT command behaviour against a booted node.

mod mock_support;

use lora_relay::command::{Action, COMMANDS};
use lora_relay::config::{DeviceConfig, FieldId};
use lora_relay::modbus::SerialConfig;
use lora_relay::radio::mock::RadioCall;
use mock_support::boot;
use std::time::Duration;

#[test]
fn test_ping() {
    let mut h = boot();
    assert_eq!(h.send("AT+"), vec!["OK"]);
}

#[test]
fn test_version() {
    let mut h = boot();
    assert_eq!(
        h.send("AT+VERSION"),
        vec![format!("VERSION:{}", env!("CARGO_PKG_VERSION")), "OK".to_string()]
    );
}

#[test]
fn test_set_then_status_reports_value() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETSF=9"), vec!["OK"]);
    assert_eq!(h.send("AT+SETSF=7"), vec!["OK"]);
    assert_eq!(h.status_value("SF").as_deref(), Some("7"));
}

#[test]
fn test_out_of_range_keeps_prior_value() {
    let mut h = boot();
    h.send("AT+SETSF=10");
    let before = h.node.config().clone();

    assert_eq!(h.send("AT+SETSF=13"), vec!["ERROR: Invalid SF (6-12)"]);
    assert_eq!(h.node.config(), &before);
    assert_eq!(h.status_value("SF").as_deref(), Some("10"));
}

#[test]
fn test_unknown_command() {
    let mut h = boot();
    let before = h.node.config().clone();
    assert_eq!(h.send("AT+FOO"), vec!["ERROR: Invalid command"]);
    assert_eq!(h.send("HELLO"), vec!["ERROR: Invalid command"]);
    assert_eq!(h.send("AT+STATUS=1"), vec!["ERROR: Invalid command"]);
    assert_eq!(h.node.config(), &before);
    assert!(h.radio.calls().is_empty());
}

#[test]
fn test_missing_value() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETSF"), vec!["ERROR: Missing value for AT+SETSF"]);
    assert_eq!(h.send("AT+SETRF="), vec!["ERROR: Missing value for AT+SETRF"]);
}

#[test]
fn test_garbage_tokens_rejected() {
    let mut h = boot();
    for line in [
        "AT+SETTXPWR=abc",
        "AT+SETTXPWR=20dBm",
        "AT+SETRF=99999999999999999999",
        "AT+SETRF=-865000000",
        "AT+SETFIXLEN=true",
        "AT+SETDEBUG=2",
    ] {
        let reply = h.send(line);
        assert_eq!(reply.len(), 1, "{line}");
        assert!(reply[0].starts_with("ERROR: Invalid "), "{line}: {reply:?}");
    }
    assert_eq!(h.node.config().tx_output_power, 20);
}

#[test]
fn test_setrf_applies_once_in_order() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETRF=865000000"), vec!["OK"]);

    let calls = h.radio.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], RadioCall::Standby);
    assert!(matches!(calls[1], RadioCall::TxConfig(_)));
    assert!(matches!(calls[2], RadioCall::RxConfig(_)));
    assert_eq!(calls[3], RadioCall::Channel(865_000_000));
}

#[test]
fn test_every_radio_field_applies_immediately() {
    let mut h = boot();
    let lines = [
        "AT+SETRF=868000000",
        "AT+SETTXPWR=14",
        "AT+SETSF=10",
        "AT+SETBW=1",
        "AT+SETCR=3",
        "AT+SETPREAMBLE=12",
        "AT+SETSYMTIMEOUT=100",
        "AT+SETFIXLEN=1",
        "AT+SETIQINV=1",
        "AT+SETTXTIMEOUT=2500",
    ];
    for (i, line) in lines.iter().enumerate() {
        assert_eq!(h.send(line), vec!["OK"], "{line}");
        assert_eq!(h.radio.apply_count(), i + 1, "{line}");
    }

    let Some(RadioCall::TxConfig(tx)) = h
        .radio
        .calls()
        .iter()
        .rev()
        .find(|c| matches!(c, RadioCall::TxConfig(_)))
        .cloned()
    else {
        panic!("no TX config recorded");
    };
    assert_eq!(tx.power_dbm, 14);
    assert_eq!(tx.timeout_ms, 2500);
    assert!(tx.packet.implicit_header);
    assert!(tx.packet.iq_inverted);
}

#[test]
fn test_set_only_fields_leave_radio_alone() {
    let mut h = boot();
    for line in [
        "AT+SETDEBUG=1",
        "AT+SETLBT_RSSI=-100",
        "AT+SETLBT_TIME=50",
        "AT+SETLBT_RETRY=3",
        "AT+SETMODBUSDELAY=20",
        "AT+SETBEACONINT=60000",
    ] {
        assert_eq!(h.send(line), vec!["OK"], "{line}");
    }
    assert!(h.radio.calls().is_empty());
    let config = h.node.config();
    assert_eq!(config.lbt_rssi_threshold, -100);
    assert_eq!(config.lbt_time_ms, 50);
    assert_eq!(config.lbt_retry, 3);
    assert_eq!(config.modbus_read_delay_ms, 20);
    assert_eq!(config.beacon_interval_ms, 60_000);
}

#[test]
fn test_modbus_baud_switches_link() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETMODBUSBD=19200"), vec!["OK"]);
    assert_eq!(h.modbus.history(), vec![19_200]);
    assert_eq!(h.node.config().modbus_baudrate, 19_200);
}

#[test]
fn test_modbus_timing_follows_config() {
    let mut h = boot();
    let boot_timing = SerialConfig::from_device_config(&DeviceConfig::default());
    assert_eq!(
        h.modbus.timing(),
        Some((boot_timing.timeout, boot_timing.inter_frame_delay))
    );

    assert_eq!(h.send("AT+SETMODBUSDELAY=20"), vec!["OK"]);
    assert_eq!(h.send("AT+SETMODBUSBD=1200"), vec!["OK"]);
    assert_eq!(
        h.modbus.timing(),
        Some((Duration::from_millis(100 + 2133), Duration::from_millis(20)))
    );
    assert_eq!(h.modbus.history(), vec![1200]);
}

#[test]
fn test_modbus_failure_keeps_config() {
    let mut h = boot();
    h.modbus.set_failing(true);
    assert_eq!(
        h.send("AT+SETMODBUSBD=19200"),
        vec!["ERROR: Modbus baud change failed"]
    );
    assert_eq!(h.node.config().modbus_baudrate, 9600);
}

#[test]
fn test_apply_reapplies_current_config() {
    let mut h = boot();
    assert_eq!(h.send("AT+APPLY"), vec!["OK"]);
    assert_eq!(h.radio.apply_count(), 1);
}

#[test]
fn test_save_change_load() {
    let mut h = boot();
    h.send("AT+SETSF=11");
    h.send("AT+SETLBT_RETRY=8");
    assert_eq!(h.send("AT+SAVE"), vec!["OK"]);

    h.send("AT+SETSF=6");
    h.send("AT+SETLBT_RETRY=0");
    h.radio.clear();
    assert_eq!(h.send("AT+LOAD"), vec!["OK"]);

    assert_eq!(h.node.config().lora_spreading_factor, 11);
    assert_eq!(h.node.config().lbt_retry, 8);
    assert_eq!(h.radio.apply_count(), 1);
}

#[test]
fn test_load_without_snapshot_gives_defaults() {
    let mut h = boot();
    h.send("AT+SETSF=12");
    assert_eq!(h.send("AT+LOAD"), vec!["OK"]);
    assert_eq!(h.node.config().lora_spreading_factor, 7);
}

#[test]
fn test_defaults_restore_and_apply() {
    let mut h = boot();
    h.send("AT+SETDEBUG=1");
    h.send("AT+SETTXPWR=5");
    h.send("AT+SETMODBUSBD=38400");
    h.radio.clear();

    let reply = h.send("AT+DEFAULTS");
    assert_eq!(reply.last().map(String::as_str), Some("OK"));
    assert!(reply[0].starts_with("DBG: "));
    assert_eq!(h.node.config().tx_output_power, 20);
    assert_eq!(h.node.config().modbus_baudrate, 9600);
    assert!(h.node.config().debug);
    assert_eq!(h.radio.apply_count(), 1);
    assert_eq!(h.modbus.history(), vec![38_400, 9600]);
}

#[test]
fn test_debug_output_only_when_enabled() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETSF=8"), vec!["OK"]);
    h.send("AT+SETDEBUG=1");
    let reply = h.send("AT+SETSF=9");
    assert_eq!(reply.len(), 2);
    assert!(reply[0].starts_with("DBG: RF=865000000"));
}

#[test]
fn test_status_lists_every_field() {
    let mut h = boot();
    let reply = h.send("AT+STATUS");
    assert_eq!(reply.len(), FieldId::ALL.len() + 1);
    assert_eq!(reply.last().map(String::as_str), Some("OK"));
    assert!(reply.contains(&"DEBUG=0".to_string()));
    assert!(reply.contains(&"BUFFER_SIZE=512".to_string()));
}

#[test]
fn test_help_lists_every_command() {
    let mut h = boot();
    let reply = h.send("AT+HELP");
    assert_eq!(reply.len(), COMMANDS.len() + 1);
    for descriptor in COMMANDS {
        assert!(reply.iter().any(|l| l.starts_with(descriptor.name)), "{}", descriptor.name);
    }
}

#[test]
fn test_replies_end_in_exactly_one_status_line() {
    let mut h = boot();
    for descriptor in COMMANDS {
        let line = match descriptor.action {
            Action::Set(_) | Action::Beacon => format!("{}=1", descriptor.name),
            _ => descriptor.name.to_string(),
        };
        let reply = h.send(&line);
        let status_lines = reply
            .iter()
            .filter(|l| *l == "OK" || l.starts_with("ERROR:"))
            .count();
        assert_eq!(status_lines, 1, "{line}: {reply:?}");
        let last = reply.last().cloned().unwrap_or_default();
        assert!(last == "OK" || last.starts_with("ERROR:"), "{line}");
    }
}

#[test]
fn test_trailing_carriage_return_accepted() {
    let mut h = boot();
    assert_eq!(h.send("AT+SETSF=8\r"), vec!["OK"]);
    assert_eq!(h.node.config().lora_spreading_factor, 8);
}
