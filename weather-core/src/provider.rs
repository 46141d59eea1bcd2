use crate::{
    config::OpenWeatherConfig,
    error::WeatherError,
    model::{CurrentWeatherSnapshot, ForecastSample, GeoLocation, Units},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// The three upstream lookups a weather-by-day query may need.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions by city name.
    async fn current_weather(
        &self,
        city: &str,
        units: Units,
        lang: &str,
    ) -> Result<CurrentWeatherSnapshot, WeatherError>;

    /// Candidate locations for a city name, best match first.
    async fn geocode(&self, city: &str) -> Result<Vec<GeoLocation>, WeatherError>;

    /// 3-hour forecast buckets for the next five days at a location.
    async fn forecast(
        &self,
        location: &GeoLocation,
        units: Units,
        lang: &str,
    ) -> Result<Vec<ForecastSample>, WeatherError>;
}

/// Construct the OpenWeather provider from resolved configuration.
pub fn provider_from_config(config: &OpenWeatherConfig) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::new(config)?;
    Ok(Box::new(provider))
}
