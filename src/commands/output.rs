//! Rendering of backend results for the terminal
//!
//! Every listing has a table form built with prettytable and a JSON form
//! that mirrors the backend's wire format.

use chrono::{DateTime, Utc};
use prettytable::{cell, row, Table};
use serde::Serialize;

use crate::api::{Sensor, TemperatureReading, TemperatureStats};
use crate::error::{Result, WoodstoveError};

/// Print any serializable value as pretty JSON
///
/// # Errors
///
/// Returns `WoodstoveError::Serialization` if serialization fails
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(WoodstoveError::Serialization)?;
    println!("{}", json);
    Ok(())
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_temperature(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

pub(crate) fn readings_table(readings: &[TemperatureReading]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Sensor", "Temperature", "Recorded At"]);
    for reading in readings {
        table.add_row(row![
            reading.id,
            reading.sensor_id,
            format_temperature(Some(reading.temperature)),
            format_time(&reading.recorded_at)
        ]);
    }
    table
}

pub(crate) fn stats_table(stats: &TemperatureStats) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Current", "Min", "Max", "Average", "Readings"]);
    table.add_row(row![
        format_temperature(stats.current),
        format_temperature(stats.min),
        format_temperature(stats.max),
        format_temperature(stats.avg),
        stats.reading_count
    ]);
    table
}

pub(crate) fn sensors_table(sensors: &[Sensor]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Sensor"]);
    for sensor in sensors {
        table.add_row(row![sensor.sensor_id]);
    }
    table
}

/// Output readings in table format
pub fn output_readings(readings: &[TemperatureReading]) {
    if readings.is_empty() {
        println!("No readings found.");
        return;
    }
    println!();
    readings_table(readings).printstd();
    println!();
}

/// Output statistics in table format
pub fn output_stats(stats: &TemperatureStats) {
    let scope = stats.sensor_id.as_deref().unwrap_or("all sensors");
    println!(
        "\nStatistics for {} from {} to {}:\n",
        scope,
        format_time(&stats.period_start),
        format_time(&stats.period_end)
    );
    stats_table(stats).printstd();
    println!();
}

/// Output sensors in table format
pub fn output_sensors(sensors: &[Sensor]) {
    if sensors.is_empty() {
        println!("No sensors have reported yet.");
        return;
    }
    println!();
    sensors_table(sensors).printstd();
    println!();
}
