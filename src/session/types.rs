//! Session data model
//!
//! [`Session`] snapshots are only constructed through [`Session::anonymous`],
//! [`Session::authenticated`] and the loading constructors, so a snapshot
//! carrying a user always carries a token and vice versa.

use serde::{Deserialize, Serialize};

/// Display identity of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account email address
    pub email: String,
    /// Account display name
    pub display_name: String,
    /// Profile picture URL
    pub avatar_url: String,
}

/// Lifecycle phase of the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// `initialize()` has not run yet
    Uninitialized,
    /// Restoring the persisted token
    Restoring,
    /// No usable credential
    Anonymous,
    /// Signed in with a non-expired credential
    Authenticated,
}

/// Snapshot of the client's current belief about who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    phase: SessionPhase,
    user: Option<User>,
    token: Option<String>,
}

impl Session {
    /// Initial snapshot before any restoration attempt.
    pub fn uninitialized() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            user: None,
            token: None,
        }
    }

    /// Snapshot published while the persisted token is being read.
    pub fn restoring() -> Self {
        Self {
            phase: SessionPhase::Restoring,
            user: None,
            token: None,
        }
    }

    /// Signed-out snapshot.
    pub fn anonymous() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            user: None,
            token: None,
        }
    }

    /// Signed-in snapshot.
    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            user: Some(user),
            token: Some(token),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// In-memory copy of the token. Request signing reads storage instead,
    /// see [`SessionStore::get_token`](super::SessionStore::get_token).
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// `true` until the first restoration attempt resolves.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Uninitialized | SessionPhase::Restoring
        )
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::uninitialized()
    }
}
