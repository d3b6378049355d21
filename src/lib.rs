//! Woodstove - client session lifecycle for the woodstove temperature API
//!
//! This library keeps track of who is signed in, persists and restores the
//! bearer token across runs, bridges to the Google Identity Services sign-in
//! widget, and attaches the token to every backend request.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `credential`: Decoding of compact ID tokens into user details
//! - `storage`: Token persistence backends (keyring, file, memory)
//! - `session`: The observable session store
//! - `identity`: Sign-in widget capability and its loopback adapter
//! - `api`: Session-aware client for the temperature backend
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use woodstove::api::{ApiClient, StatsPeriod, StatsQuery};
//! use woodstove::{storage, Config, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let session = SessionStore::new(storage::from_config(&config.storage)?);
//!     session.initialize();
//!
//!     let client = ApiClient::from_config(&config.api, Arc::new(session))?;
//!     let stats = client
//!         .get_stats(&StatsQuery {
//!             sensor_id: None,
//!             period: Some(StatsPeriod::Week),
//!         })
//!         .await?;
//!     println!("{} readings this week", stats.reading_count);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credential;
pub mod error;
pub mod identity;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use api::ApiClient;
pub use config::Config;
pub use credential::{decode, DecodedCredential};
pub use error::{Result, WoodstoveError};
pub use identity::{IdentityBridge, IdentityProvider};
pub use session::{Session, SessionPhase, SessionStore, User};
pub use storage::TokenStorage;
