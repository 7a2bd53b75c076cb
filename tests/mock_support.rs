// Shared harness for node-level integration tests
#![allow(dead_code)]

use lora_relay::beacon::{ManualClock, RecordingBeaconSink};
use lora_relay::config::{MemoryStorage, Storage};
use lora_relay::modbus::MockModbusLink;
use lora_relay::radio::mock::RecordingRadio;
use lora_relay::RelayNode;

/// Clock reading at boot
pub const BOOT_MS: u64 = 10_000;

pub struct Harness {
    pub node: RelayNode<RecordingRadio>,
    pub radio: RecordingRadio,
    pub clock: ManualClock,
    pub modbus: MockModbusLink,
    pub beacons: RecordingBeaconSink,
}

pub fn boot() -> Harness {
    boot_with_storage(MemoryStorage::new())
}

pub fn boot_with_storage(storage: impl Storage + 'static) -> Harness {
    let radio = RecordingRadio::new();
    let clock = ManualClock::new(BOOT_MS);
    let modbus = MockModbusLink::new(9600);
    let beacons = RecordingBeaconSink::new();
    let node = RelayNode::boot(
        radio.clone(),
        storage,
        modbus.clone(),
        clock.clone(),
        beacons.clone(),
    )
    .expect("boot");
    radio.clear();
    Harness {
        node,
        radio,
        clock,
        modbus,
        beacons,
    }
}

impl Harness {
    /// Send one line, returning every reply line
    pub fn send(&mut self, line: &str) -> Vec<String> {
        self.node.handle_line(line).lines()
    }

    /// Value of `key` in the `AT+STATUS` dump
    pub fn status_value(&mut self, key: &str) -> Option<String> {
        let prefix = format!("{key}=");
        self.send("AT+STATUS")
            .into_iter()
            .find_map(|line| line.strip_prefix(&prefix).map(str::to_string))
    }
}
