/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`     -- Sign in, sign out and session status
- `readings` -- Record and query temperature readings, stats and sensors
- `output`   -- Table and JSON rendering shared by the handlers

Every handler starts from a restored [`SessionStore`] so that the bearer
token persisted by a previous `login` is picked up automatically.
*/

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;
use crate::storage;

pub mod auth;
pub mod output;
pub mod readings;

/// Builds the session store from configuration and restores any persisted
/// session.
///
/// # Errors
///
/// Returns an error if the configured storage backend cannot be opened.
pub fn open_session(config: &Config) -> Result<Arc<SessionStore>> {
    let storage = storage::from_config(&config.storage)?;
    let session = SessionStore::new(storage).with_token_key(config.storage.key.clone());
    session.initialize();
    tracing::debug!(phase = ?session.snapshot().phase(), "session restored");
    Ok(Arc::new(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use crate::session::SessionPhase;

    #[test]
    fn test_open_session_without_token_is_anonymous() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;

        let session = open_session(&config).expect("open");
        assert_eq!(session.snapshot().phase(), SessionPhase::Anonymous);
        assert!(session.get_token().is_none());
    }

    #[test]
    fn test_open_session_restores_from_file_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.storage.backend = StorageBackend::File;
        config.storage.path = Some(dir.path().to_path_buf());

        let token = crate::credential::tests::token_expiring_at(4_102_444_800);
        std::fs::write(dir.path().join("auth_token"), &token).expect("write token");

        let session = open_session(&config).expect("open");
        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.user().map(|u| u.email.as_str()), Some("a@b.com"));
    }
}
