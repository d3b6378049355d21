//! Temperature commands: record, list, stats and sensors
//!
//! Each handler builds an [`ApiClient`] over the restored session, so the
//! request carries whatever token `login` persisted. A rejected token ends
//! the session and surfaces as [`WoodstoveError::SessionExpired`](crate::error::WoodstoveError::SessionExpired).

use chrono::{DateTime, Utc};

use crate::api::{ApiClient, ReadingQuery, StatsPeriod, StatsQuery, TemperatureRequest};
use crate::commands::{open_session, output};
use crate::config::Config;
use crate::error::Result;

fn client(config: &Config) -> Result<ApiClient> {
    let session = open_session(config)?;
    ApiClient::from_config(&config.api, session)
}

/// Record one reading
pub async fn record(
    config: &Config,
    sensor: String,
    temperature: f64,
    recorded_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let mut request = TemperatureRequest::new(sensor, temperature);
    if let Some(at) = recorded_at {
        request = request.recorded_at(at);
    }

    let reading = client(config)?.post_temperature(&request).await?;
    tracing::info!(id = reading.id, sensor = %reading.sensor_id, "reading recorded");
    println!(
        "Recorded {:.1} for {} (id {})",
        reading.temperature, reading.sensor_id, reading.id
    );
    Ok(())
}

/// List readings matching `query`
pub async fn list_readings(config: &Config, query: ReadingQuery, json: bool) -> Result<()> {
    let readings = client(config)?.list_temperatures(&query).await?;
    tracing::debug!(count = readings.len(), "readings fetched");
    if json {
        return output::print_json(&readings);
    }
    output::output_readings(&readings);
    Ok(())
}

/// Show statistics for one period
pub async fn show_stats(
    config: &Config,
    sensor: Option<String>,
    period: Option<StatsPeriod>,
    json: bool,
) -> Result<()> {
    let query = StatsQuery {
        sensor_id: sensor,
        period,
    };
    let stats = client(config)?.get_stats(&query).await?;
    if json {
        return output::print_json(&stats);
    }
    output::output_stats(&stats);
    Ok(())
}

/// List sensors known to the backend
pub async fn list_sensors(config: &Config, json: bool) -> Result<()> {
    let sensors = client(config)?.list_sensors().await?;
    if json {
        return output::print_json(&sensors);
    }
    output::output_sensors(&sensors);
    Ok(())
}
