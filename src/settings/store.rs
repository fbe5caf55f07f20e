use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use toml::{Value, map::Map};

use super::SettingsError;

/// Capacity of the per-store change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A live handle to one persisted key-value settings document.
///
/// Implementations expose the declared keys, synchronous reads and writes,
/// and a change-event stream yielding the names of keys whose values changed.
pub trait SettingsStore: Send + Sync {
    /// Returns the keys declared by this store.
    fn key_list(&self) -> Vec<String>;

    /// Returns the current value of `key`, or `None` if absent.
    fn value(&self, key: &str) -> Option<Value>;

    /// Writes `value` through to the store.
    ///
    /// # Errors
    /// Returns [`SettingsError::PersistenceError`] if the backing document
    /// cannot be written.
    fn set_value(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    /// Subscribes to change events. Each event carries the changed key name.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

/// File-backed settings store over a flat TOML table.
///
/// Reads are served from memory; writes update the in-memory table, persist
/// the whole document back to its path and then broadcast the changed key.
/// An in-memory variant without a backing path is available for providers
/// that synthesize stores.
pub struct DocumentStore {
    document: RwLock<Map<String, Value>>,
    path: Option<PathBuf>,
    change_sender: broadcast::Sender<String>,
}

impl DocumentStore {
    /// Loads a store from a TOML document on disk.
    ///
    /// # Errors
    /// * [`SettingsError::PersistenceError`] - if the file cannot be read
    /// * [`SettingsError::ParseError`] - if the content is not a TOML table
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|e| SettingsError::PersistenceError {
            path: path.clone(),
            details: e.to_string(),
        })?;

        let document: Map<String, Value> =
            toml::from_str(&content).map_err(|e| SettingsError::ParseError {
                path: path.clone(),
                details: e.to_string(),
            })?;

        let (change_sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            document: RwLock::new(document),
            path: Some(path),
            change_sender,
        })
    }

    /// Creates a store from an in-memory table with no backing file.
    pub fn in_memory(document: Map<String, Value>) -> Self {
        let (change_sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            document: RwLock::new(document),
            path: None,
            change_sender,
        }
    }

    /// Returns the backing file path, if the store is persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Creates a stream that yields the names of keys as they change.
    ///
    /// A lagging consumer skips missed events instead of erroring.
    pub fn changes(&self) -> impl Stream<Item = String> + Send + use<> {
        BroadcastStream::new(self.change_sender.subscribe()).filter_map(Result::ok)
    }

    fn persist(&self, document: &Map<String, Value>) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let serialized =
            toml::to_string(document).map_err(|e| SettingsError::PersistenceError {
                path: path.clone(),
                details: e.to_string(),
            })?;

        fs::write(path, serialized).map_err(|e| SettingsError::PersistenceError {
            path: path.clone(),
            details: e.to_string(),
        })
    }
}

impl SettingsStore for DocumentStore {
    fn key_list(&self) -> Vec<String> {
        match self.document.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    fn value(&self, key: &str) -> Option<Value> {
        match self.document.read() {
            Ok(guard) => guard.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    fn set_value(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        {
            let mut document = match self.document.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            document.insert(key.to_string(), value);
            self.persist(&document)?;
        }

        // No receivers is fine; nobody is watching this store yet.
        let _ = self.change_sender.send(key.to_string());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.change_sender.subscribe()
    }
}
