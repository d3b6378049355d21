//! Command-line interface definition for Woodstove
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for signing in and out and for talking to the
//! temperature backend.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::api::StatsPeriod;
use crate::config::StorageBackend;

/// Woodstove - woodstove temperature client
///
/// Sign in with Google and read or record stove temperatures.
#[derive(Parser, Debug, Clone)]
#[command(name = "woodstove")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the backend base URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// Override where the session token is stored
    #[arg(long, value_enum)]
    pub storage: Option<StorageBackend>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Woodstove
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in through the browser
    Login {
        /// OAuth client id (overrides identity.client_id)
        #[arg(long)]
        client_id: Option<String>,

        /// Loopback port for the sign-in page (overrides identity.callback_port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Give up waiting for a credential after this many seconds
        #[arg(long, default_value_t = 300)]
        timeout_seconds: u64,

        /// Print the sign-in URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Sign out and forget the stored token
    Logout,

    /// Show the current session
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a temperature reading
    Record {
        /// Sensor identifier
        #[arg(short, long)]
        sensor: String,

        /// Temperature value
        #[arg(short, long, allow_negative_numbers = true)]
        temperature: f64,

        /// Measurement time (RFC 3339); the backend uses "now" when omitted
        #[arg(long)]
        recorded_at: Option<DateTime<Utc>>,
    },

    /// List temperature readings
    Readings {
        /// Only readings from this sensor
        #[arg(short, long)]
        sensor: Option<String>,

        /// Maximum number of readings
        #[arg(short, long)]
        limit: Option<u32>,

        /// Earliest reading time (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Latest reading time (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show temperature statistics for a period
    Stats {
        /// Only this sensor
        #[arg(short, long)]
        sensor: Option<String>,

        /// Reporting period
        #[arg(short, long, value_enum)]
        period: Option<StatsPeriod>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known sensors
    Sensors {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            api_base: None,
            storage: None,
            command: Commands::Status { json: false },
        }
    }
}
