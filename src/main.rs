//! Woodstove - woodstove temperature client
//!
#![doc = "Woodstove - woodstove temperature client"]
#![doc = "Main entry point for the woodstove command-line application."]

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use woodstove::api::ReadingQuery;
use woodstove::cli::{Cli, Commands};
use woodstove::commands;
use woodstove::commands::auth::LoginArgs;
use woodstove::config::Config;
use woodstove::error::WoodstoveError;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            let expired = e
                .downcast_ref::<WoodstoveError>()
                .is_some_and(WoodstoveError::requires_sign_in);
            if expired {
                eprintln!("Run {} to sign in again.", "woodstove login".cyan());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Login {
            client_id,
            port,
            timeout_seconds,
            no_browser,
        } => {
            tracing::info!("Starting sign-in");
            let args = LoginArgs {
                client_id,
                port,
                timeout_seconds,
                no_browser,
            };
            commands::auth::login(config, args).await
        }
        Commands::Logout => commands::auth::logout(&config),
        Commands::Status { json } => commands::auth::status(&config, json),
        Commands::Record {
            sensor,
            temperature,
            recorded_at,
        } => commands::readings::record(&config, sensor, temperature, recorded_at).await,
        Commands::Readings {
            sensor,
            limit,
            from,
            to,
            json,
        } => {
            let query = ReadingQuery {
                sensor_id: sensor,
                limit,
                from,
                to,
            };
            commands::readings::list_readings(&config, query, json).await
        }
        Commands::Stats {
            sensor,
            period,
            json,
        } => commands::readings::show_stats(&config, sensor, period, json).await,
        Commands::Sensors { json } => commands::readings::list_sensors(&config, json).await,
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_filter = if verbose { "woodstove=debug" } else { "woodstove=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
