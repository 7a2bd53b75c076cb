//! # Relay Node
//!
//! [`RelayNode`] owns the live [`DeviceConfig`] together with everything that
//! must follow it: the radio, the settings store, the Modbus link, the clock
//! and the beacon sink. Every mutation goes through [`RelayNode::handle_line`]
//! (or the scheduler's [`RelayNode::tick`]), so one `&mut` borrow, or one lock
//! of a [`SharedNode`], covers a whole read-modify-apply sequence.
//!
//! ## Boot
//!
//! ```text
//! load_config ──> reset volatile ──> Modbus line ──> apply radio
//! ```
//!
//! ## Failed apply
//!
//! If the radio rejects a new configuration the previous one is restored and
//! re-applied on a best-effort basis, and the command replies
//! `ERROR: Radio apply failed`.

use crate::beacon::{build_beacon_payload, BeaconScheduler, BeaconSink, Clock};
use crate::command::{commands, CommandError, DispatchError, Effect, Outcome, Reply};
use crate::config::{load_config, save_config, DeviceConfig, Storage};
use crate::constants::{FIRMWARE_VERSION, RESET_INTERVAL_MS};
use crate::error::RelayError;
use crate::logging::log_exchange;
use crate::modbus::{ModbusError, ModbusLink, SerialConfig};
use crate::radio::bridge::{apply_config_to_radio, describe, RadioControl};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// A node shared between the console task and the scheduler task
pub type SharedNode<R> = Arc<Mutex<RelayNode<R>>>;

pub struct RelayNode<R: RadioControl> {
    config: DeviceConfig,
    radio: R,
    storage: Box<dyn Storage>,
    modbus: Box<dyn ModbusLink>,
    clock: Box<dyn Clock>,
    beacon_sink: Box<dyn BeaconSink>,
    scheduler: BeaconScheduler,
    boot_ms: u64,
    last_reset_ms: u64,
}

impl<R: RadioControl> RelayNode<R> {
    /// Load settings and bring radio and Modbus link in line with them.
    pub fn boot(
        radio: R,
        storage: impl Storage + 'static,
        modbus: impl ModbusLink + 'static,
        clock: impl Clock + 'static,
        beacon_sink: impl BeaconSink + 'static,
    ) -> Result<Self, RelayError> {
        let mut storage: Box<dyn Storage> = Box::new(storage);
        let now = clock.now_ms();
        let (config, _) = load_config(storage.as_mut(), now);

        let mut node = Self {
            config,
            radio,
            storage,
            modbus: Box::new(modbus),
            clock: Box::new(clock),
            beacon_sink: Box::new(beacon_sink),
            scheduler: BeaconScheduler::new(),
            boot_ms: now,
            last_reset_ms: now,
        };
        node.sync_modbus()?;
        apply_config_to_radio(&node.config, &mut node.radio)?;
        info!("Relay node v{FIRMWARE_VERSION} up");
        Ok(node)
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.now_ms().saturating_sub(self.boot_ms)
    }

    /// Beacons sent since boot
    pub fn beacons_sent(&self) -> u64 {
        self.scheduler.fired()
    }

    /// Run one AT line and produce its reply
    pub fn handle_line(&mut self, line: &str) -> Reply {
        let now = self.clock.now_ms();
        debug!("AT> {}", line.trim_end());
        let result = commands::interpret(&self.config, line, now)
            .and_then(|outcome| self.perform(outcome, now));
        match result {
            Ok(reply) => reply,
            Err(e) => {
                if !e.is_input_error() {
                    warn!("{} failed: {e}", line.trim_end());
                }
                Reply::from(e)
            }
        }
    }

    fn perform(&mut self, outcome: Outcome, now: u64) -> Result<Reply, CommandError> {
        let Outcome {
            config,
            mut info,
            effect,
        } = outcome;

        match effect {
            Effect::None => self.config = config,
            Effect::ApplyRadio => self.transition(config, true, false)?,
            Effect::SyncModbus => self.transition(config, false, true)?,
            Effect::Save => save_config(&self.config, self.storage.as_mut())?,
            Effect::Reload => {
                let (mut loaded, _) = load_config(self.storage.as_mut(), now);
                loaded.debug = self.config.debug;
                loaded.last_beacon_ms = self.config.last_beacon_ms;
                self.transition(loaded, true, true)?;
            }
            Effect::Reconfigure => self.transition(config, true, true)?,
        }

        let touched_radio = matches!(
            effect,
            Effect::ApplyRadio | Effect::Reload | Effect::Reconfigure
        );
        if touched_radio && self.config.debug {
            info.push(format!("DBG: {}", describe(&self.config)));
        }
        Ok(Reply::ok_with(info))
    }

    /// Install `next`, pushing it to the Modbus link and/or radio.
    ///
    /// On failure the previous configuration is back in place when this returns.
    fn transition(
        &mut self,
        next: DeviceConfig,
        radio: bool,
        modbus: bool,
    ) -> Result<(), CommandError> {
        let previous = std::mem::replace(&mut self.config, next);

        if modbus {
            if let Err(e) = self.sync_modbus() {
                self.config = previous;
                return Err(e.into());
            }
        }

        if radio {
            if let Err(e) = apply_config_to_radio(&self.config, &mut self.radio) {
                warn!("Radio apply failed ({e}), restoring previous settings");
                self.config = previous;
                if let Err(e) = apply_config_to_radio(&self.config, &mut self.radio) {
                    error!("Radio restore failed: {e}");
                }
                if modbus {
                    if let Err(e) = self.sync_modbus() {
                        error!("Modbus restore failed: {e}");
                    }
                }
                return Err(e.into());
            }
            info!("Radio settings applied");
        }
        Ok(())
    }

    fn sync_modbus(&mut self) -> Result<(), ModbusError> {
        let line = SerialConfig::from_device_config(&self.config);
        if self.modbus.baud_rate() != line.baudrate {
            self.modbus.set_baud_rate(line.baudrate)?;
        }
        self.modbus.set_timing(line.timeout, line.inter_frame_delay)
    }

    /// Fire the beacon if it is due. Returns whether it fired.
    pub fn poll_beacon(&mut self) -> bool {
        let now = self.clock.now_ms();
        if !self.scheduler.poll(&mut self.config, now) {
            return false;
        }
        match build_beacon_payload(&self.config, now.saturating_sub(self.boot_ms)) {
            Ok(payload) => self.beacon_sink.deliver(&payload),
            Err(e) => warn!("Beacon skipped: {e}"),
        }
        true
    }

    /// Whether the periodic maintenance reset is due at `now_ms`
    pub fn maintenance_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_reset_ms) >= RESET_INTERVAL_MS
    }

    /// Reload persisted settings, reset volatile fields and re-apply hardware,
    /// as a reboot would.
    pub fn soft_reset(&mut self) -> Result<(), RelayError> {
        let now = self.clock.now_ms();
        let (loaded, _) = load_config(self.storage.as_mut(), now);
        self.last_reset_ms = now;
        self.transition(loaded, true, true)?;
        info!("Maintenance reset done");
        Ok(())
    }

    /// One scheduler step: beacon, then maintenance reset when due
    pub fn tick(&mut self) -> Result<(), RelayError> {
        self.poll_beacon();
        if self.maintenance_due(self.clock.now_ms()) {
            self.soft_reset()?;
        }
        Ok(())
    }
}

/// Serve AT lines from `reader`, writing each reply to `writer`.
///
/// Each line runs under one lock of `node`. Blank lines are ignored and a
/// line that is not valid UTF-8 is answered as an invalid command. Returns at
/// end of input or on an I/O error.
pub async fn run_console<R, Rd, W>(
    node: SharedNode<R>,
    reader: Rd,
    mut writer: W,
) -> Result<(), RelayError>
where
    R: RadioControl,
    Rd: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let reply = node.lock().await.handle_line(line);
                log_exchange(line, &reply);
                reply
            }
            Err(e) => {
                warn!("Console line is not UTF-8 ({e}): {}", hex::encode(&buf));
                Reply::from(CommandError::from(DispatchError::InvalidCommand))
            }
        };
        for out in reply.lines() {
            writer.write_all(out.as_bytes()).await?;
            writer.write_all(b"\r\n").await?;
        }
        writer.flush().await?;
    }
    debug!("Console input closed");
    Ok(())
}

/// Tick `node` every `period` forever
pub async fn run_scheduler<R: RadioControl>(node: SharedNode<R>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        if let Err(e) = node.lock().await.tick() {
            error!("Scheduler tick failed: {e}");
        }
    }
}
