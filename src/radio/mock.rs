//! Recording doubles for the radio stack.
//!
//! [`RecordingHal`] captures every SPI command and register write the driver
//! issues. [`RecordingRadio`] sits one level higher and captures the
//! [`RadioControl`] calls made by the apply bridge. Both are cheaply cloneable;
//! clones share the same log, so a test can keep a handle after moving the
//! double into a node.

use crate::radio::bridge::{RadioControl, RxConfig, TxConfig};
use crate::radio::driver::RadioError;
use crate::radio::hal::{Hal, HalError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HAL that records traffic instead of talking SPI
#[derive(Debug, Clone, Default)]
pub struct RecordingHal {
    commands: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    registers: Arc<Mutex<Vec<(u16, Vec<u8>)>>>,
    fail_opcode: Arc<Mutex<Option<u8>>>,
}

impl RecordingHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write of `opcode` fail with [`HalError::Spi`]
    pub fn fail_on(&self, opcode: u8) {
        *lock(&self.fail_opcode) = Some(opcode);
    }

    pub fn clear_failure(&self) {
        *lock(&self.fail_opcode) = None;
    }

    /// `(opcode, payload)` for every command written so far
    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        lock(&self.commands).clone()
    }

    /// Opcodes only, in issue order
    pub fn opcodes(&self) -> Vec<u8> {
        lock(&self.commands).iter().map(|(op, _)| *op).collect()
    }

    pub fn register_writes(&self) -> Vec<(u16, Vec<u8>)> {
        lock(&self.registers).clone()
    }

    pub fn clear(&self) {
        lock(&self.commands).clear();
        lock(&self.registers).clear();
    }
}

impl Hal for RecordingHal {
    fn write_command(&mut self, opcode: u8, data: &[u8]) -> Result<(), HalError> {
        if *lock(&self.fail_opcode) == Some(opcode) {
            return Err(HalError::Spi);
        }
        lock(&self.commands).push((opcode, data.to_vec()));
        Ok(())
    }

    fn write_register(&mut self, addr: u16, data: &[u8]) -> Result<(), HalError> {
        lock(&self.registers).push((addr, data.to_vec()));
        Ok(())
    }
}

/// One call observed by [`RecordingRadio`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Standby,
    TxConfig(TxConfig),
    RxConfig(RxConfig),
    Channel(u32),
}

/// Which [`RadioCall`] step a [`RecordingRadio`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStep {
    Standby,
    TxConfig,
    RxConfig,
    Channel,
}

/// [`RadioControl`] that records calls, optionally failing one step
#[derive(Debug, Clone, Default)]
pub struct RecordingRadio {
    calls: Arc<Mutex<Vec<RadioCall>>>,
    fail_step: Arc<Mutex<Option<FailStep>>>,
}

impl RecordingRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        lock(&self.calls).clone()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    pub fn fail_on(&self, step: FailStep) {
        *lock(&self.fail_step) = Some(step);
    }

    pub fn clear_failure(&self) {
        *lock(&self.fail_step) = None;
    }

    /// Number of completed standby → TX → RX → channel sequences
    pub fn apply_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, RadioCall::Channel(_)))
            .count()
    }

    fn record(&self, step: FailStep, call: RadioCall) -> Result<(), RadioError> {
        if *lock(&self.fail_step) == Some(step) {
            return Err(RadioError::Hal(HalError::Spi));
        }
        lock(&self.calls).push(call);
        Ok(())
    }
}

impl RadioControl for RecordingRadio {
    fn standby(&mut self) -> Result<(), RadioError> {
        self.record(FailStep::Standby, RadioCall::Standby)
    }

    fn set_tx_config(&mut self, config: &TxConfig) -> Result<(), RadioError> {
        self.record(FailStep::TxConfig, RadioCall::TxConfig(*config))
    }

    fn set_rx_config(&mut self, config: &RxConfig) -> Result<(), RadioError> {
        self.record(FailStep::RxConfig, RadioCall::RxConfig(*config))
    }

    fn set_channel(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        self.record(FailStep::Channel, RadioCall::Channel(frequency_hz))
    }
}
