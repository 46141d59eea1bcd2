use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::WeatherError;

/// Measurement system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Kelvin,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Kelvin => "kelvin",
        }
    }

    /// Value of the provider's `units` query parameter. Kelvin is its "standard" system.
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Kelvin => "standard",
        }
    }
}

impl FromStr for Units {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "kelvin" => Ok(Units::Kelvin),
            other => Err(WeatherError::InvalidParameter(format!(
                "Unknown units '{other}'. Use 'metric', 'imperial' or 'kelvin'"
            ))),
        }
    }
}

/// A weather-by-day query as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct WeatherQuery {
    pub city: String,
    /// `today`, `tomorrow` or `YYYY-MM-DD`; absent means today.
    pub date: Option<String>,
    pub units: Units,
    /// Provider language code, e.g. `pt_br`. Absent means the configured default.
    pub lang: Option<String>,
}

/// Result of a geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub name: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            main: "Unknown".to_string(),
            description: "Unknown".to_string(),
            icon: String::new(),
        }
    }
}

/// Attributes shared by forecast buckets and current-conditions snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// UTC epoch seconds.
    pub timestamp: i64,
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    pub condition: Condition,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub clouds: f64,
    /// Meters.
    pub visibility: Option<f64>,
}

/// One 3-hour forecast bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub reading: Reading,
    /// Precipitation probability as a 0.0..=1.0 fraction.
    pub pop: f64,
}

impl ForecastSample {
    pub fn timestamp(&self) -> i64 {
        self.reading.timestamp
    }
}

/// Output of the current-conditions endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeatherSnapshot {
    pub city: String,
    pub country: String,
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureBlock {
    pub min: i64,
    pub max: i64,
    pub current: i64,
    pub feels_like: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindBlock {
    pub speed: f64,
    pub direction: i64,
}

/// The uniform response shape for both the current-weather and forecast paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedWeatherReport {
    pub date: String,
    pub day_of_week: String,
    pub city: String,
    pub country: String,
    pub temperature: TemperatureBlock,
    pub weather: Condition,
    pub humidity: i64,
    pub pressure: i64,
    pub wind: WindBlock,
    pub clouds: i64,
    /// Kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
    pub precipitation_probability: i64,
}
