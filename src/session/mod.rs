//! Session lifecycle management
//!
//! [`SessionStore`] is the single writer of the client's [`Session`]. It
//! restores a persisted token at startup, records a fresh sign-in, and clears
//! everything on logout. Every transition is broadcast over a
//! `tokio::sync::watch` channel so any number of observers can follow the
//! session without being able to mutate it.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --initialize()--> Restoring --+--> Anonymous
//!                                             +--> Authenticated
//! any --set_user()--> Authenticated
//! any --logout()----> Anonymous
//! ```
//!
//! Storage failures never escape the store: they are logged and the store
//! degrades to `Anonymous`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::credential;
use crate::error::WoodstoveError;
use crate::identity::IdentityProvider;
use crate::storage::{TokenStorage, DEFAULT_TOKEN_KEY};

pub mod types;

pub use types::{Session, SessionPhase, User};

/// Owner of the current [`Session`].
///
/// Methods take `&self`; share the store as `Arc<SessionStore>` between the
/// sign-in callback, the request layer and the UI. Transitions must not be
/// called reentrantly from inside a subscriber.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use woodstove::session::{SessionPhase, SessionStore};
/// use woodstove::storage::MemoryStorage;
///
/// let store = SessionStore::new(Arc::new(MemoryStorage::new()));
/// store.initialize();
/// assert_eq!(store.snapshot().phase(), SessionPhase::Anonymous);
/// assert!(!store.snapshot().is_loading());
/// ```
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
    token_key: String,
    identity: Option<Arc<dyn IdentityProvider>>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Creates an `Uninitialized` store persisting under [`DEFAULT_TOKEN_KEY`].
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let (state, _) = watch::channel(Session::uninitialized());
        Self {
            storage,
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            identity: None,
            state,
        }
    }

    /// Overrides the storage key.
    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Attaches the identity provider told to stop auto-selecting on logout.
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(provider);
        self
    }

    /// Restores the session from storage.
    ///
    /// Publishes `Restoring`, then resolves within the same call:
    ///
    /// - no persisted token: `Anonymous`
    /// - token fails to decode: persisted token deleted, `Anonymous`
    /// - token expired: `Anonymous`, persisted token left in place
    /// - otherwise: `Authenticated` with the decoded identity
    ///
    /// Calling it again re-runs restoration.
    pub fn initialize(&self) {
        self.restore_at(Utc::now());
    }

    pub(crate) fn restore_at(&self, now: DateTime<Utc>) {
        self.publish(Session::restoring());

        let Some(token) = self.read_persisted() else {
            tracing::debug!("no persisted token");
            self.publish(Session::anonymous());
            return;
        };

        match credential::decode(&token) {
            Err(e) => {
                tracing::warn!("discarding persisted token: {}", e);
                self.remove_persisted();
                self.publish(Session::anonymous());
            }
            Ok(decoded) if decoded.is_expired_at(now) => {
                // The stale token stays in storage; only undecodable tokens
                // are purged here.
                tracing::info!(email = %decoded.email, "persisted token expired");
                self.publish(Session::anonymous());
            }
            Ok(decoded) => {
                tracing::info!(email = %decoded.email, "session restored");
                self.publish(Session::authenticated(decoded.user(), token));
            }
        }
    }

    /// Records a successful sign-in and persists `token`.
    ///
    /// Overwrites any existing session without comparing identities. A
    /// storage failure is logged; the in-memory session is still updated.
    pub fn set_user(&self, user: User, token: String) {
        if let Err(e) = self.storage.set(&self.token_key, &token) {
            tracing::warn!("failed to persist token: {:#}", e);
        }
        tracing::info!(email = %user.email, "signed in");
        self.publish(Session::authenticated(user, token));
    }

    /// Decodes a freshly issued credential and signs in with it.
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::MalformedToken`] if the credential cannot be
    /// decoded, or [`WoodstoveError::SessionExpired`] if it is already
    /// expired. The session is left unchanged in both cases.
    pub fn sign_in_with_credential(&self, token: String) -> Result<User, WoodstoveError> {
        let decoded = credential::decode(&token)?;
        if decoded.is_expired_at(Utc::now()) {
            return Err(WoodstoveError::SessionExpired(
                "The issued credential has already expired.".to_string(),
            ));
        }
        let user = decoded.user();
        self.set_user(user.clone(), token);
        Ok(user)
    }

    /// Signs out: clears storage, publishes `Anonymous` and tells the
    /// identity provider to stop auto-selecting the account.
    pub fn logout(&self) {
        self.remove_persisted();
        self.publish(Session::anonymous());
        if let Some(identity) = &self.identity {
            identity.disable_auto_select();
        }
        tracing::info!("signed out");
    }

    /// Reads the token straight from storage.
    ///
    /// This bypasses the in-memory session so a request issued before
    /// [`initialize`](Self::initialize) completes is still signed.
    pub fn get_token(&self) -> Option<String> {
        self.read_persisted()
    }

    /// The current session.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Registers an observer.
    ///
    /// The receiver is marked changed, so the first `changed().await`
    /// completes immediately with the current value; each later transition
    /// wakes it again. Intermediate values may be coalesced.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        let mut rx = self.state.subscribe();
        rx.mark_changed();
        rx
    }

    /// Stream of snapshots: the current one first, then one per change.
    pub fn updates(&self) -> WatchStream<Session> {
        WatchStream::new(self.state.subscribe())
    }

    fn publish(&self, session: Session) {
        tracing::debug!(phase = ?session.phase(), "session transition");
        self.state.send_replace(session);
    }

    fn read_persisted(&self) -> Option<String> {
        match self.storage.get(&self.token_key) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("failed to read persisted token: {:#}", e);
                None
            }
        }
    }

    fn remove_persisted(&self) {
        if let Err(e) = self.storage.remove(&self.token_key) {
            tracing::warn!("failed to remove persisted token: {:#}", e);
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("token_key", &self.token_key)
            .field("phase", &self.state.borrow().phase())
            .field("has_identity_provider", &self.identity.is_some())
            .finish()
    }
}
