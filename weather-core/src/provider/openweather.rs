use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::OpenWeatherConfig,
    error::WeatherError,
    model::{Condition, CurrentWeatherSnapshot, ForecastSample, GeoLocation, Reading, Units},
};

use super::WeatherProvider;

const CURRENT_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODING_PATH: &str = "/geo/1.0/direct";

/// OpenWeather client. Holds the API key and a pooled HTTP client; safe to share.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: &OpenWeatherConfig) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
        params: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(endpoint = path, "Calling OpenWeather ({what})");

        let res = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| WeatherError::UpstreamTransportFailure {
                status: e.status().map(|s| s.as_u16()),
                message: format!("Failed to send request to OpenWeather ({what}): {e}"),
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| WeatherError::UpstreamTransportFailure {
            status: Some(status.as_u16()),
            message: format!("Failed to read OpenWeather {what} response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::UnclassifiedFailure(format!("Failed to parse OpenWeather {what} JSON: {e}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(
        &self,
        city: &str,
        units: Units,
        lang: &str,
    ) -> Result<CurrentWeatherSnapshot, WeatherError> {
        let parsed: OwCurrentResponse = self
            .get_json(
                CURRENT_PATH,
                "current weather",
                &[
                    ("q", city.to_string()),
                    ("units", units.as_query().to_string()),
                    ("lang", lang.to_string()),
                ],
            )
            .await?;

        Ok(parsed.into())
    }

    async fn geocode(&self, city: &str) -> Result<Vec<GeoLocation>, WeatherError> {
        let parsed: Vec<OwGeoEntry> = self
            .get_json(
                GEOCODING_PATH,
                "geocoding",
                &[("q", city.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        Ok(parsed.into_iter().map(Into::into).collect())
    }

    async fn forecast(
        &self,
        location: &GeoLocation,
        units: Units,
        lang: &str,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let parsed: OwForecastResponse = self
            .get_json(
                FORECAST_PATH,
                "5-day forecast",
                &[
                    ("lat", location.lat.to_string()),
                    ("lon", location.lon.to_string()),
                    ("units", units.as_query().to_string()),
                    ("lang", lang.to_string()),
                ],
            )
            .await?;

        Ok(parsed.list.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

/// Prefer the provider's own `message`, fall back to the raw body.
fn upstream_error(status: StatusCode, body: &str) -> WeatherError {
    let message = serde_json::from_str::<OwErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            format!("OpenWeather request failed with status {}: {}", status, truncate_body(body))
        });

    WeatherError::UpstreamTransportFailure { status: Some(status.as_u16()), message }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<f64>,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<f64>,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
}

fn reading(
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    clouds: OwClouds,
    visibility: Option<f64>,
) -> Reading {
    let condition = weather
        .into_iter()
        .next()
        .map(|w| Condition { main: w.main, description: w.description, icon: w.icon })
        .unwrap_or_default();

    Reading {
        timestamp: dt,
        temp: main.temp,
        temp_min: main.temp_min,
        temp_max: main.temp_max,
        feels_like: main.feels_like,
        condition,
        humidity: main.humidity,
        pressure: main.pressure,
        wind_speed: wind.speed,
        wind_deg: wind.deg,
        clouds: clouds.all,
        visibility,
    }
}

impl From<OwCurrentResponse> for CurrentWeatherSnapshot {
    fn from(r: OwCurrentResponse) -> Self {
        CurrentWeatherSnapshot {
            city: r.name,
            country: r.sys.country,
            reading: reading(r.dt, r.main, r.weather, r.wind, r.clouds, r.visibility),
        }
    }
}

impl From<OwForecastEntry> for ForecastSample {
    fn from(e: OwForecastEntry) -> Self {
        ForecastSample {
            reading: reading(e.dt, e.main, e.weather, e.wind, e.clouds, e.visibility),
            pop: e.pop,
        }
    }
}

impl From<OwGeoEntry> for GeoLocation {
    fn from(g: OwGeoEntry) -> Self {
        GeoLocation { name: g.name, country: g.country, lat: g.lat, lon: g.lon }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
