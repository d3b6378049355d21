//! Token persistence via the OS keyring
//!
//! Stores the raw token string in the operating system's native credential
//! store (Keychain on macOS, Secret Service on Linux, Windows Credential
//! Manager on Windows). The keyring itself is stateless; [`KeyringStorage`]
//! only carries the service name that namespaces our entries.

use crate::error::{Result, WoodstoveError};
use crate::storage::TokenStorage;

/// Default keyring service name.
pub const DEFAULT_SERVICE: &str = "woodstove";

/// [`TokenStorage`] backed by the OS keyring.
///
/// Each storage key maps to one keyring entry whose user is the key and whose
/// service is the configured service name.
///
/// # Examples
///
/// ```no_run
/// use woodstove::storage::{KeyringStorage, TokenStorage};
///
/// let storage = KeyringStorage::new("woodstove");
/// storage.set("auth_token", "header.payload.signature").unwrap();
/// assert!(storage.get("auth_token").unwrap().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(|e| WoodstoveError::Keyring(e).into())
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl TokenStorage for KeyringStorage {
    /// Returns `Ok(None)` when no entry exists, so callers can distinguish
    /// "never signed in" from a genuine keyring failure.
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(WoodstoveError::Keyring(e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(WoodstoveError::Keyring)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(WoodstoveError::Keyring(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let storage = KeyringStorage::default();
        assert_eq!(storage.service, "woodstove");
    }

    // -----------------------------------------------------------------------
    // Keyring integration tests  (require system keyring; skipped in CI)
    // -----------------------------------------------------------------------

    #[test]
    #[ignore = "requires system keyring"]
    fn test_set_get_remove_via_keyring() {
        let storage = KeyringStorage::new("woodstove-test");
        let key = "integration_token";

        storage.set(key, "h.p.s").expect("set");
        assert_eq!(storage.get(key).expect("get"), Some("h.p.s".to_string()));

        storage.remove(key).expect("remove");
        assert_eq!(storage.get(key).expect("get after remove"), None);
    }

    #[test]
    #[ignore = "requires system keyring"]
    fn test_remove_is_idempotent() {
        let storage = KeyringStorage::new("woodstove-test");
        storage.remove("idempotent_remove").expect("first remove");
        storage
            .remove("idempotent_remove")
            .expect("second remove is no-op");
    }
}
