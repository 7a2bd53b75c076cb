//! # Radio Apply Bridge
//!
//! Translates a [`DeviceConfig`] into the sequence of radio calls that brings
//! the transceiver in line with it. The sequence is fixed:
//!
//! ```text
//! standby ──> TX config ──> RX config ──> channel
//! ```
//!
//! Parameters are only rewritten while the radio idles in standby, and the
//! frequency goes last so the radio never sits on a new channel with a stale
//! bandwidth. The first failing step aborts the sequence.

use crate::config::DeviceConfig;
use crate::radio::driver::{PacketType, RadioError, StandbyMode, Sx126xDriver};
use crate::radio::hal::Hal;
use crate::radio::modulation::{
    CodingRate, LoRaBandwidth, LoRaModParams, LoRaPacketParams, SpreadingFactor,
};
use log::debug;

/// Largest LoRa payload the packet engine accepts
pub const MAX_PAYLOAD_LEN: u8 = 255;

/// PA ramp time code for 200 µs
const RAMP_200_US: u8 = 0x04;

/// Transmit-side radio parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxConfig {
    pub power_dbm: i8,
    pub modulation: LoRaModParams,
    pub packet: LoRaPacketParams,
    pub timeout_ms: u32,
}

/// Receive-side radio parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxConfig {
    pub modulation: LoRaModParams,
    pub packet: LoRaPacketParams,
    /// Preamble search window in symbols, 0 for continuous
    pub symbol_timeout: u16,
}

/// The calls the bridge needs from a radio library
pub trait RadioControl {
    fn standby(&mut self) -> Result<(), RadioError>;
    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), RadioError>;
    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), RadioError>;
    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), RadioError>;
}

impl<R: RadioControl + ?Sized> RadioControl for Box<R> {
    fn standby(&mut self) -> Result<(), RadioError> {
        (**self).standby()
    }

    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), RadioError> {
        (**self).set_tx_config(config)
    }

    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), RadioError> {
        (**self).set_rx_config(config)
    }

    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        (**self).set_channel(frequency_hz)
    }
}

fn modulation(config: &DeviceConfig) -> Result<LoRaModParams, RadioError> {
    let sf = SpreadingFactor::from_value(config.lora_spreading_factor).ok_or_else(|| {
        RadioError::InvalidParams(format!("spreading factor {}", config.lora_spreading_factor))
    })?;
    let bw = LoRaBandwidth::from_code(config.lora_bandwidth).ok_or_else(|| {
        RadioError::InvalidParams(format!("bandwidth code {}", config.lora_bandwidth))
    })?;
    let cr = CodingRate::from_code(config.lora_coding_rate).ok_or_else(|| {
        RadioError::InvalidParams(format!("coding rate code {}", config.lora_coding_rate))
    })?;
    Ok(LoRaModParams::new(sf, bw, cr))
}

fn packet(config: &DeviceConfig) -> LoRaPacketParams {
    LoRaPacketParams {
        preamble_len: config.lora_preamble_length,
        implicit_header: config.lora_fix_length_payload,
        payload_len: MAX_PAYLOAD_LEN,
        crc_on: true,
        iq_inverted: config.lora_iq_inversion,
    }
}

/// TX parameters for `config`
pub fn tx_config(config: &DeviceConfig) -> Result<TxConfig, RadioError> {
    Ok(TxConfig {
        power_dbm: config.tx_output_power,
        modulation: modulation(config)?,
        packet: packet(config),
        timeout_ms: config.tx_timeout_ms,
    })
}

/// RX parameters for `config`
pub fn rx_config(config: &DeviceConfig) -> Result<RxConfig, RadioError> {
    Ok(RxConfig {
        modulation: modulation(config)?,
        packet: packet(config),
        symbol_timeout: config.lora_symbol_timeout,
    })
}

/// Push `config` to the radio: standby, TX, RX, then channel.
///
/// Both parameter sets are derived before the radio is touched, so a config
/// that cannot be expressed never leaves the radio half-written.
pub fn apply_config_to_radio<R: RadioControl + ?Sized>(
    config: &DeviceConfig,
    radio: &mut R,
) -> Result<(), RadioError> {
    let tx = tx_config(config)?;
    let rx = rx_config(config)?;

    radio.standby()?;
    radio.set_tx_config(&tx)?;
    radio.set_rx_config(&rx)?;
    radio.set_channel(config.rf_frequency)?;

    debug!(
        "Radio configured: {} Hz, SF{}, BW {} Hz, {} dBm",
        config.rf_frequency,
        tx.modulation.sf as u8,
        tx.modulation.bw.hz(),
        tx.power_dbm
    );
    Ok(())
}

/// One-line summary of the radio parameters in effect, for debug replies
pub fn describe(config: &DeviceConfig) -> String {
    let bw_hz = LoRaBandwidth::from_code(config.lora_bandwidth).map_or(0, LoRaBandwidth::hz);
    format!(
        "RF={} PWR={} SF={} BW={} CR=4/{} PRE={} SYMTO={} FIXLEN={} IQINV={} TXTO={}",
        config.rf_frequency,
        config.tx_output_power,
        config.lora_spreading_factor,
        bw_hz,
        config.lora_coding_rate as u16 + 4,
        config.lora_preamble_length,
        config.lora_symbol_timeout,
        u8::from(config.lora_fix_length_payload),
        u8::from(config.lora_iq_inversion),
        config.tx_timeout_ms
    )
}

impl<H: Hal> RadioControl for Sx126xDriver<H> {
    fn standby(&mut self) -> Result<(), RadioError> {
        self.set_standby(StandbyMode::RC)
    }

    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), RadioError> {
        self.set_packet_type(PacketType::LoRa)?;
        self.set_modulation_params(config.modulation)?;
        self.set_packet_params(config.packet)?;
        // SX1262 high-power PA, full +22 dBm table
        self.set_pa_config(0x04, 0x07, 0x00)?;
        self.set_tx_params(config.power_dbm, RAMP_200_US)?;
        self.set_tx_timeout_ms(config.timeout_ms);
        Ok(())
    }

    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), RadioError> {
        self.set_packet_type(PacketType::LoRa)?;
        self.set_modulation_params(config.modulation)?;
        self.set_packet_params(config.packet)?;
        self.set_lora_symb_num_timeout(config.symbol_timeout)?;
        self.set_buffer_base_addresses(0x00, 0x00)
    }

    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        self.set_rf_frequency(frequency_hz)
    }
}
