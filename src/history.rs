//! Bounded, persisted result history.
//!
//! A [`HistoryStore`] keeps the most recent entries of one kind of
//! record, newest first, and writes the whole list back to a
//! [`KeyValueStore`] as JSON after every change.

use crate::errors::AppError;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Storage key for speed test results.
pub const SPEED_TEST_HISTORY_KEY: &str = "speedTestHistory";

/// Storage key for transfer time calculations.
pub const CALCULATOR_HISTORY_KEY: &str = "timeCalculatorHistory";

/// Maximum number of entries kept per history.
pub const MAX_HISTORY_ENTRIES: usize = 10;

/// String-valued key-value storage backing a history.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!(
                "failed to read {}: {}",
                self.path_for(key).display(),
                e
            ))
            .with_source(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;

        // Replace atomically via rename.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// In-memory store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError>
    {
        self.entries
            .lock()
            .map_err(|e| AppError::storage(format!("store poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Bounded list of records persisted under a single key.
pub struct HistoryStore<T> {
    key: String,
    capacity: usize,
    items: Vec<T>,
    backend: Box<dyn KeyValueStore>,
}

impl<T> HistoryStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the history stored under `key`, seeding it from `backend`.
    pub fn open(
        key: impl Into<String>,
        backend: impl KeyValueStore + 'static,
    ) -> Self {
        let mut store = Self {
            key: key.into(),
            capacity: MAX_HISTORY_ENTRIES,
            items: Vec::new(),
            backend: Box::new(backend),
        };
        store.items = store.load();
        store
    }

    /// Read the persisted list.
    ///
    /// Missing, unreadable or malformed data yields an empty history.
    pub fn load(&self) -> Vec<T> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read history '{}': {}", self.key, e.message);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(mut items) => {
                items.truncate(self.capacity);
                items
            }
            Err(e) => {
                warn!("Ignoring malformed history '{}': {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Prepend `item`, keep the most recent entries and persist the list.
    ///
    /// The in-memory list is updated even when persisting fails.
    pub fn append(&mut self, item: T) -> Result<(), AppError> {
        self.items.insert(0, item);
        self.items.truncate(self.capacity);
        self.persist()
    }

    /// Remove every entry and persist the empty list.
    pub fn clear(&mut self) -> Result<(), AppError> {
        self.items.clear();
        self.persist()
    }

    /// Entries, newest first.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Storage key of this history.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn persist(&mut self) -> Result<(), AppError> {
        let encoded = serde_json::to_string(&self.items)?;
        self.backend.set(&self.key, &encoded)
    }
}
