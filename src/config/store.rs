//! Loading and saving [`DeviceConfig`] through a [`Storage`] backend.

use super::validator;
use super::{DeviceConfig, FieldId, OpenMode, Storage, StorageError};
use crate::constants::SETTINGS_NAMESPACE;
use log::{debug, info, warn};

/// What a [`load_config`] call found in storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Fields taken from storage
    pub loaded: usize,
    /// Fields absent from storage, left at the compiled default
    pub defaulted: usize,
    /// Fields present but unusable (wrong type, out of range, read error)
    pub rejected: usize,
}

/// Build a configuration from the persisted snapshot.
///
/// Starts from compiled defaults and overlays every persisted key that passes
/// its field rule. The volatile fields are reset (`debug` off, last beacon at
/// `now_ms`). A namespace that cannot be opened yields pure defaults.
pub fn load_config(storage: &mut dyn Storage, now_ms: u64) -> (DeviceConfig, LoadReport) {
    let mut config = DeviceConfig::default();
    let mut report = LoadReport::default();

    match storage.open(SETTINGS_NAMESPACE, OpenMode::ReadOnly) {
        Ok(ns) => {
            for field in FieldId::ALL {
                let Some(key) = field.persist_key() else {
                    continue;
                };
                match ns.load(key) {
                    Ok(Some(stored)) => match validator::check(field, stored) {
                        Ok(value) => {
                            config.set(value);
                            report.loaded += 1;
                        }
                        Err(e) => {
                            warn!("Ignoring stored {key}={stored:?}: {e}");
                            report.rejected += 1;
                        }
                    },
                    Ok(None) => {
                        debug!("No stored value for {key}, using default");
                        report.defaulted += 1;
                    }
                    Err(e) => {
                        warn!("Failed to read {key}: {e}");
                        report.rejected += 1;
                    }
                }
            }
        }
        Err(e) => {
            warn!("Settings namespace unavailable ({e}), using compiled defaults");
            report.defaulted = FieldId::ALL
                .iter()
                .filter(|f| f.persist_key().is_some())
                .count();
        }
    }

    config.reset_volatile(now_ms);
    info!(
        "Configuration loaded: {} stored, {} defaulted, {} rejected",
        report.loaded, report.defaulted, report.rejected
    );
    (config, report)
}

/// Write every persisted field of `config`. Volatile fields are skipped.
pub fn save_config(config: &DeviceConfig, storage: &mut dyn Storage) -> Result<(), StorageError> {
    let mut ns = storage.open(SETTINGS_NAMESPACE, OpenMode::ReadWrite)?;
    let mut written = 0usize;
    for field in FieldId::ALL {
        if let Some(key) = field.persist_key() {
            ns.store(key, config.get(field))?;
            written += 1;
        }
    }
    ns.commit()?;
    info!("Configuration saved: {written} fields");
    Ok(())
}
