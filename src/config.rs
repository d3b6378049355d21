//! Configuration management for Woodstove
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! `WOODSTOVE_*` environment variables, command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WoodstoveError};
use crate::identity::ButtonOptions;
use crate::storage::keyring_store::DEFAULT_SERVICE;
use crate::storage::DEFAULT_TOKEN_KEY;

/// Main configuration structure for Woodstove
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Sign-in widget settings
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Token persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    ///
    /// When unset the HTTP client's own defaults apply.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// API key sent as `X-API-Key` when recording readings
    #[serde(default)]
    pub sensor_api_key: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
            sensor_api_key: None,
        }
    }
}

/// Sign-in widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// OAuth client identifier registered with the identity provider
    #[serde(default)]
    pub client_id: String,

    /// Let the widget sign a returning user in without a click
    #[serde(default = "default_auto_select")]
    pub auto_select: bool,

    /// Loopback port for the hosted sign-in page (0 = ephemeral)
    #[serde(default)]
    pub callback_port: u16,

    /// Appearance of the sign-in button
    #[serde(default)]
    pub button: ButtonOptions,
}

fn default_auto_select() -> bool {
    true
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            auto_select: default_auto_select(),
            callback_port: 0,
            button: ButtonOptions::default(),
        }
    }
}

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// OS credential store
    #[default]
    Keyring,
    /// Plain file in the user's data directory
    File,
    /// Process memory; nothing survives a restart
    Memory,
    /// No persistence at all
    None,
}

impl std::str::FromStr for StorageBackend {
    type Err = WoodstoveError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "none" => Ok(Self::None),
            other => Err(WoodstoveError::Config(format!(
                "Invalid storage backend: {other}. Must be one of: keyring, file, memory, none"
            ))),
        }
    }
}

/// Token persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Storage key holding the token
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// Keyring service name
    #[serde(default = "default_storage_service")]
    pub service: String,

    /// Directory for the file backend (defaults to the platform data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_storage_key() -> String {
    DEFAULT_TOKEN_KEY.to_string()
}

fn default_storage_service() -> String {
    DEFAULT_SERVICE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            key: default_storage_key(),
            service: default_storage_service(),
            path: None,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::Config`] if the file exists but cannot be
    /// read or parsed.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WoodstoveError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| WoodstoveError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("WOODSTOVE_API_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("WOODSTOVE_API_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = Some(value);
            } else {
                tracing::warn!("Invalid WOODSTOVE_API_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(key) = std::env::var("WOODSTOVE_SENSOR_API_KEY") {
            self.api.sensor_api_key = Some(key);
        }

        if let Ok(client_id) = std::env::var("WOODSTOVE_CLIENT_ID") {
            self.identity.client_id = client_id;
        }

        if let Ok(port) = std::env::var("WOODSTOVE_CALLBACK_PORT") {
            if let Ok(value) = port.parse() {
                self.identity.callback_port = value;
            } else {
                tracing::warn!("Invalid WOODSTOVE_CALLBACK_PORT: {}", port);
            }
        }

        if let Ok(backend) = std::env::var("WOODSTOVE_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(value) => self.storage.backend = value,
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if let Ok(path) = std::env::var("WOODSTOVE_STORAGE_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(base_url) = &cli.api_base {
            self.api.base_url = base_url.clone();
        }
        if let Some(backend) = cli.storage {
            self.storage.backend = backend;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let base_url = url::Url::parse(&self.api.base_url).map_err(|e| {
            WoodstoveError::Config(format!("Invalid api.base_url {}: {}", self.api.base_url, e))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(WoodstoveError::Config(format!(
                "api.base_url must use http or https, got {}",
                base_url.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == Some(0) {
            return Err(WoodstoveError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.key.trim().is_empty() {
            return Err(
                WoodstoveError::Config("storage.key cannot be empty".to_string()).into(),
            );
        }

        if self.storage.backend == StorageBackend::Keyring && self.storage.service.is_empty() {
            return Err(WoodstoveError::Config(
                "storage.service cannot be empty for the keyring backend".to_string(),
            )
            .into());
        }

        let width = self.identity.button.width;
        if !(200..=400).contains(&width) {
            return Err(WoodstoveError::Config(format!(
                "identity.button.width must be between 200 and 400, got {}",
                width
            ))
            .into());
        }

        Ok(())
    }
}
