//! Wire types for the temperature backend
//!
//! Field names follow the backend's camelCase JSON; timestamps are RFC 3339
//! instants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /temperatures`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureRequest {
    pub sensor_id: String,
    pub temperature: f64,
    /// Measurement time; the backend stamps the reading itself when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl TemperatureRequest {
    pub fn new(sensor_id: impl Into<String>, temperature: f64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            temperature,
            recorded_at: None,
        }
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(at);
        self
    }
}

/// A stored temperature reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub id: i64,
    pub sensor_id: String,
    pub temperature: f64,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over one reporting period
///
/// All numeric aggregates are `None` when the period holds no readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStats {
    pub current: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub reading_count: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(default)]
    pub sensor_id: Option<String>,
}

/// A sensor known to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub sensor_id: String,
}

/// Reporting period for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Hour,
    #[default]
    Day,
    Week,
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsPeriod::Hour => write!(f, "hour"),
            StatsPeriod::Day => write!(f, "day"),
            StatsPeriod::Week => write!(f, "week"),
        }
    }
}

/// Query parameters for `GET /temperatures`
///
/// Unset fields are omitted from the query string and the backend applies
/// its own defaults (all sensors, limit 100, no time bounds).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /temperatures/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<StatsPeriod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_missing_recorded_at() {
        let json = serde_json::to_value(TemperatureRequest::new("stove-1", 212.5)).unwrap();
        assert_eq!(json, serde_json::json!({"sensorId": "stove-1", "temperature": 212.5}));
    }

    #[test]
    fn test_reading_parses_backend_payload() {
        let reading: TemperatureReading = serde_json::from_str(
            r#"{"id":7,"sensorId":"stove-1","temperature":180.0,
                "recordedAt":"2024-01-15T10:00:00Z","createdAt":"2024-01-15T10:00:01.123Z"}"#,
        )
        .unwrap();
        assert_eq!(reading.id, 7);
        assert_eq!(reading.sensor_id, "stove-1");
        assert_eq!(reading.recorded_at.to_rfc3339(), "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn test_stats_with_empty_period() {
        let stats: TemperatureStats = serde_json::from_str(
            r#"{"current":null,"min":null,"max":null,"avg":null,"readingCount":0,
                "periodStart":"2024-01-14T10:00:00Z","periodEnd":"2024-01-15T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(stats.reading_count, 0);
        assert!(stats.avg.is_none());
        assert!(stats.sensor_id.is_none());
    }

    #[test]
    fn test_stats_keeps_null_sensor_id() {
        let body = serde_json::json!({
            "current": null,
            "min": null,
            "max": null,
            "avg": null,
            "readingCount": 0,
            "periodStart": "2024-01-14T10:00:00Z",
            "periodEnd": "2024-01-15T10:00:00Z",
            "sensorId": null
        });
        let stats: TemperatureStats = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(serde_json::to_value(&stats).unwrap(), body);
    }

    #[test]
    fn test_stats_period_display_matches_wire_format() {
        for period in [StatsPeriod::Hour, StatsPeriod::Day, StatsPeriod::Week] {
            let wire = serde_json::to_value(period).unwrap();
            assert_eq!(wire, serde_json::Value::String(period.to_string()));
        }
        assert_eq!(StatsPeriod::default(), StatsPeriod::Day);
    }
}
