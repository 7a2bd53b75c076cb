//! # Beacon Scheduler
//!
//! A polled periodic trigger gated by `beacon_enabled`. The main loop calls
//! [`BeaconScheduler::poll`] every [`SCHEDULER_TICK_MS`]; when the configured
//! interval has elapsed since `last_beacon_ms` the beacon fires and the
//! timestamp moves to "now".
//!
//! The beacon itself is a small CBOR map describing the node, handed to a
//! [`BeaconSink`] (the messaging layer).
//!
//! [`SCHEDULER_TICK_MS`]: crate::constants::SCHEDULER_TICK_MS

use crate::config::DeviceConfig;
use crate::constants::FIRMWARE_VERSION;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;

/// Millisecond time source
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock. Clones share one counter.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Tracks beacon firings against [`DeviceConfig`]'s beacon fields
#[derive(Debug, Default, Clone)]
pub struct BeaconScheduler {
    fired: u64,
}

impl BeaconScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a beacon is due at `now_ms`, and records the firing.
    ///
    /// A `now_ms` earlier than `last_beacon_ms` counts as zero elapsed time.
    pub fn poll(&mut self, config: &mut DeviceConfig, now_ms: u64) -> bool {
        if !config.beacon_enabled {
            return false;
        }
        let elapsed = now_ms.saturating_sub(config.last_beacon_ms);
        if elapsed < u64::from(config.beacon_interval_ms) {
            return false;
        }
        config.last_beacon_ms = now_ms;
        self.fired += 1;
        true
    }

    /// Beacons fired since construction
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

/// Content of one beacon transmission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconPayload {
    pub version: String,
    pub frequency_hz: u32,
    pub spreading_factor: u8,
    pub tx_power_dbm: i8,
    pub uptime_s: u64,
}

impl BeaconPayload {
    pub fn from_config(config: &DeviceConfig, uptime_ms: u64) -> Self {
        Self {
            version: FIRMWARE_VERSION.to_string(),
            frequency_hz: config.rf_frequency,
            spreading_factor: config.lora_spreading_factor,
            tx_power_dbm: config.tx_output_power,
            uptime_s: uptime_ms / 1000,
        }
    }
}

#[derive(Debug, Error)]
pub enum BeaconError {
    #[error("Beacon encoding failed: {0}")]
    Encode(String),

    #[error("Beacon decoding failed: {0}")]
    Decode(String),
}

/// CBOR-encode the beacon for `config`
pub fn build_beacon_payload(config: &DeviceConfig, uptime_ms: u64) -> Result<Vec<u8>, BeaconError> {
    let payload = BeaconPayload::from_config(config, uptime_ms);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&payload, &mut buf).map_err(|e| BeaconError::Encode(e.to_string()))?;
    debug!("Beacon payload ({} bytes): {}", buf.len(), hex::encode(&buf));
    Ok(buf)
}

pub fn decode_beacon_payload(bytes: &[u8]) -> Result<BeaconPayload, BeaconError> {
    ciborium::de::from_reader(bytes).map_err(|e| BeaconError::Decode(e.to_string()))
}

/// Receiver of encoded beacons
pub trait BeaconSink: Send {
    fn deliver(&mut self, payload: &[u8]);
}

/// Sink that only logs, for hosts without a transmitter
#[derive(Debug, Default)]
pub struct LogBeaconSink;

impl BeaconSink for LogBeaconSink {
    fn deliver(&mut self, payload: &[u8]) {
        info!("Beacon: {}", hex::encode(payload));
    }
}

/// Sink that keeps every payload. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBeaconSink {
    delivered: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingBeaconSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Vec<u8>> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BeaconSink for RecordingBeaconSink {
    fn deliver(&mut self, payload: &[u8]) {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(last: u64, interval: u32) -> DeviceConfig {
        DeviceConfig {
            beacon_enabled: true,
            beacon_interval_ms: interval,
            last_beacon_ms: last,
            ..DeviceConfig::default()
        }
    }

    #[test]
    fn test_disabled_never_fires() {
        let mut scheduler = BeaconScheduler::new();
        let mut config = DeviceConfig::default();
        assert!(!scheduler.poll(&mut config, u64::MAX));
        assert_eq!(scheduler.fired(), 0);
    }

    #[test]
    fn test_fires_at_interval_boundary() {
        let mut scheduler = BeaconScheduler::new();
        let mut config = enabled(1_000, 5_000);
        assert!(!scheduler.poll(&mut config, 5_999));
        assert!(scheduler.poll(&mut config, 6_000));
        assert_eq!(config.last_beacon_ms, 6_000);
        assert!(!scheduler.poll(&mut config, 6_100));
    }

    #[test]
    fn test_clock_behind_last_beacon() {
        let mut scheduler = BeaconScheduler::new();
        let mut config = enabled(10_000, 1_000);
        assert!(!scheduler.poll(&mut config, 500));
        assert_eq!(config.last_beacon_ms, 10_000);
    }

    #[test]
    fn test_payload_decodes() {
        let config = DeviceConfig::default();
        let bytes = build_beacon_payload(&config, 61_500).unwrap();
        let decoded = decode_beacon_payload(&bytes).unwrap();
        assert_eq!(decoded.frequency_hz, 865_000_000);
        assert_eq!(decoded.spreading_factor, 7);
        assert_eq!(decoded.tx_power_dbm, 20);
        assert_eq!(decoded.uptime_s, 61);
        assert_eq!(decoded.version, FIRMWARE_VERSION);
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        other.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(7);
        assert_eq!(other.now_ms(), 7);
    }
}
