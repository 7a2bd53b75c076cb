//! Radio subsystem: HAL seam, SX126x LoRa driver and the config apply bridge.

pub mod bridge;
pub mod driver;
pub mod hal;
pub mod mock;
pub mod modulation;

pub use bridge::{apply_config_to_radio, RadioControl, RxConfig, TxConfig};
pub use driver::{RadioError, RadioState, Sx126xDriver};
pub use hal::{Hal, HalError, LoggingHal};
