//! # lora-relay - Configuration Engine for a LoRa-to-Modbus Relay Node
//!
//! The lora-relay crate drives a relay node that configures an SX126x LoRa
//! radio, bridges it to a serial Modbus line, and exposes a textual AT-command
//! interface for field configuration.
//!
//! ## Features
//!
//! - Typed, bounds-checked settings model ([`DeviceConfig`]) with one rule per field
//! - Line-oriented AT command interpreter with a static dispatch table
//! - Persistence to a flat key/value namespace (in memory or JSON on disk)
//! - Ordered radio apply: standby, TX config, RX config, then channel
//! - Polled beacon scheduler with CBOR payloads
//! - Modbus serial baud switching driven by the configuration
//! - Support for logging and error handling
//!
//! ## Usage
//!
//! ```rust
//! use lora_relay::beacon::{LogBeaconSink, MonotonicClock};
//! use lora_relay::config::MemoryStorage;
//! use lora_relay::modbus::NullModbusLink;
//! use lora_relay::radio::{LoggingHal, Sx126xDriver};
//! use lora_relay::RelayNode;
//!
//! let radio = Sx126xDriver::new(LoggingHal::new(), 32_000_000);
//! let mut node = RelayNode::boot(
//!     radio,
//!     MemoryStorage::new(),
//!     NullModbusLink::new(9600),
//!     MonotonicClock::new(),
//!     LogBeaconSink,
//! )
//! .unwrap();
//!
//! assert_eq!(node.handle_line("AT+SETSF=9").to_string(), "OK");
//! ```

pub mod beacon;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod modbus;
pub mod node;
pub mod radio;

pub use crate::error::RelayError;
pub use crate::logging::{init_logger, log_info};

pub use command::{CommandError, DispatchError, Reply};
pub use config::{DeviceConfig, FieldId, FieldValue, RangeError};
pub use node::{run_console, run_scheduler, RelayNode, SharedNode};
pub use radio::{apply_config_to_radio, RadioControl};
