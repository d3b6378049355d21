//! Error types for Woodstove
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling.
//!
//! Library operations whose failures callers must react to (credential
//! decoding, backend requests) return [`WoodstoveError`] directly.
//! Application-level code (configuration, CLI commands) uses the
//! [`Result`] alias backed by `anyhow`.

use thiserror::Error;

/// Main error type for Woodstove operations
#[derive(Error, Debug)]
pub enum WoodstoveError {
    /// The compact token could not be decoded into a credential
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The backend rejected the bearer token (HTTP 401)
    ///
    /// The local session has already been cleared when this is returned.
    #[error("{0}")]
    SessionExpired(String),

    /// The backend answered with a non-success status other than 401
    #[error("Request failed: {status} {status_text}")]
    RequestFailed {
        /// Numeric HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Identity provider errors (script load, callback server)
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl WoodstoveError {
    /// Returns `true` when the caller should prompt the user to sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

/// Result type alias for application-level Woodstove operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
