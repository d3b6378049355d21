//! Persistent key-value storage for the session token
//!
//! The session store only needs three synchronous operations on a single
//! key: get, set and remove. [`TokenStorage`] captures that capability so the
//! backing store can be swapped:
//!
//! - [`keyring_store::KeyringStorage`] -- OS credential store (default)
//! - [`file::FileStorage`] -- one file per key in the user's data directory
//! - [`MemoryStorage`] -- process-local, used by tests and `--storage memory`
//! - [`UnavailableStorage`] -- explicitly unavailable; reads nothing, writes
//!   nowhere

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Result, WoodstoveError};

pub mod file;
pub mod keyring_store;

pub use file::FileStorage;
pub use keyring_store::KeyringStorage;

/// Storage key holding the raw compact token.
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

/// Synchronous key-value capability used to persist the session token.
///
/// Removing an absent key is not an error.
pub trait TokenStorage: Send + Sync {
    /// Returns the stored value, or `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store rejects the delete.
    fn remove(&self, key: &str) -> Result<()>;

    /// `false` for a store that silently drops everything.
    fn is_available(&self) -> bool {
        true
    }
}

/// Process-local storage backed by a `HashMap`.
///
/// Clones share the same underlying map, so a test can keep a handle and
/// inspect what the session store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| WoodstoveError::Storage("memory storage lock poisoned".into()).into())
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Storage for environments without a persistence facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStorage;

impl TokenStorage for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Builds the storage backend selected in configuration.
///
/// # Errors
///
/// Returns [`WoodstoveError::Storage`] when the file backend's directory
/// cannot be determined or created.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn TokenStorage>> {
    let storage: Arc<dyn TokenStorage> = match config.backend {
        StorageBackend::Keyring => Arc::new(KeyringStorage::new(&config.service)),
        StorageBackend::File => match &config.path {
            Some(path) => Arc::new(FileStorage::new(path)?),
            None => Arc::new(FileStorage::in_data_dir()?),
        },
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::None => Arc::new(UnavailableStorage),
    };
    tracing::debug!(backend = ?config.backend, "token storage ready");
    Ok(storage)
}
