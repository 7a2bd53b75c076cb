//! Non-volatile key/value storage backends.
//!
//! Settings persist as a flat namespace of primitive-typed values, one key per
//! field. A [`Storage`] hands out a scoped [`Namespace`] handle; the handle is
//! released when dropped, so callers hold it only for one load or save.
//!
//! `Namespace::load` returns `Ok(None)` for an absent key. Falling back to a
//! default is the caller's business, never the store's.

use super::FieldValue;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Namespace not found: {0}")]
    NamespaceUnavailable(String),

    #[error("Namespace {0} opened read-only")]
    ReadOnly(String),
}

/// Access mode for [`Storage::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// An open namespace handle
pub trait Namespace {
    /// Read one key
    fn load(&self, key: &str) -> Result<Option<FieldValue>, StorageError>;

    /// Write one key
    fn store(&mut self, key: &str, value: FieldValue) -> Result<(), StorageError>;

    /// Flush pending writes to the backing medium
    fn commit(&mut self) -> Result<(), StorageError>;
}

/// A non-volatile store that can open named namespaces
pub trait Storage: Send {
    /// Open `namespace`. A read-only open of a namespace that was never written
    /// fails with [`StorageError::NamespaceUnavailable`].
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn Namespace + 'a>, StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn Namespace + 'a>, StorageError> {
        (**self).open(namespace, mode)
    }
}

// ----------------------------------------------------------------------------
// In-memory backend
// ----------------------------------------------------------------------------

/// Volatile storage, used for tests and for runs without a `--store` path.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    namespaces: HashMap<String, BTreeMap<String, FieldValue>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every key in `namespace`, if it exists
    pub fn snapshot(&self, namespace: &str) -> Option<BTreeMap<String, FieldValue>> {
        self.namespaces.get(namespace).cloned()
    }

    /// Put a raw entry, bypassing validation (for simulating foreign or stale data)
    pub fn insert_raw(&mut self, namespace: &str, key: &str, value: FieldValue) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Drop one key from `namespace`
    pub fn remove(&mut self, namespace: &str, key: &str) {
        if let Some(entries) = self.namespaces.get_mut(namespace) {
            entries.remove(key);
        }
    }
}

struct MemoryNamespace<'a> {
    name: String,
    entries: &'a mut BTreeMap<String, FieldValue>,
    mode: OpenMode,
}

impl Namespace for MemoryNamespace<'_> {
    fn load(&self, key: &str) -> Result<Option<FieldValue>, StorageError> {
        Ok(self.entries.get(key).copied())
    }

    fn store(&mut self, key: &str, value: FieldValue) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.name.clone()));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn Namespace + 'a>, StorageError> {
        let entries = match mode {
            OpenMode::ReadOnly => self
                .namespaces
                .get_mut(namespace)
                .ok_or_else(|| StorageError::NamespaceUnavailable(namespace.to_string()))?,
            OpenMode::ReadWrite => self.namespaces.entry(namespace.to_string()).or_default(),
        };
        Ok(Box::new(MemoryNamespace {
            name: namespace.to_string(),
            entries,
            mode,
        }))
    }
}

// ----------------------------------------------------------------------------
// JSON file backend
// ----------------------------------------------------------------------------

/// File-backed storage: one pretty-printed JSON document per namespace,
/// `<dir>/<namespace>.json`. Writes are staged in memory and land on disk at
/// [`Namespace::commit`] through a write-then-rename.
///
/// Entries are decoded one key at a time, so a single malformed entry fails
/// only its own `load`. A document that does not parse at all fails a
/// read-only open but is replaced by the next read-write commit.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }
}

struct JsonNamespace {
    name: String,
    path: PathBuf,
    entries: BTreeMap<String, Value>,
    mode: OpenMode,
    dirty: bool,
}

impl Namespace for JsonNamespace {
    fn load(&self, key: &str) -> Result<Option<FieldValue>, StorageError> {
        match self.entries.get(key) {
            Some(raw) => Ok(Some(FieldValue::deserialize(raw)?)),
            None => Ok(None),
        }
    }

    fn store(&mut self, key: &str, value: FieldValue) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.name.clone()));
        }
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn Namespace + 'a>, StorageError> {
        let path = self.path_for(namespace);
        let entries = if path.exists() {
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str(&json) {
                Ok(entries) => entries,
                Err(e) if mode == OpenMode::ReadWrite => {
                    warn!("Discarding unreadable {}: {e}", path.display());
                    BTreeMap::new()
                }
                Err(e) => return Err(e.into()),
            }
        } else if mode == OpenMode::ReadOnly {
            return Err(StorageError::NamespaceUnavailable(namespace.to_string()));
        } else {
            BTreeMap::new()
        };

        Ok(Box::new(JsonNamespace {
            name: namespace.to_string(),
            path,
            entries,
            mode,
            dirty: false,
        }))
    }
}
