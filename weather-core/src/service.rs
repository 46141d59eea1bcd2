//! Orchestrates a weather-by-day query: date routing, upstream calls,
//! bucket selection and normalization.

use chrono::{Local, NaiveDate};

use crate::{
    date::{self, Route},
    error::WeatherError,
    model::{NormalizedWeatherReport, WeatherQuery},
    normalize::{locale_for_lang, normalize_current, normalize_forecast},
    provider::WeatherProvider,
    select::{available_dates, select_sample},
};

/// How many dates the "date not in forecast" message lists.
const AVAILABLE_DATES_SHOWN: usize = 5;

#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
    default_lang: String,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>, default_lang: impl Into<String>) -> Self {
        Self { provider, default_lang: default_lang.into() }
    }

    /// Answer `query` relative to the local calendar date right now.
    pub async fn weather_by_day(
        &self,
        query: &WeatherQuery,
    ) -> Result<NormalizedWeatherReport, WeatherError> {
        self.weather_by_day_on(query, date::today_local()).await
    }

    /// Answer `query` as if the local calendar date were `today`.
    ///
    /// Date validation happens before any upstream call.
    pub async fn weather_by_day_on(
        &self,
        query: &WeatherQuery,
        today: NaiveDate,
    ) -> Result<NormalizedWeatherReport, WeatherError> {
        let city = query.city.trim();
        if city.is_empty() {
            return Err(WeatherError::MissingParameter(
                "The \"city\" parameter is required".to_string(),
            ));
        }

        let route = date::plan(query.date.as_deref(), today)?;
        let lang = query.lang.as_deref().filter(|l| !l.is_empty()).unwrap_or(&self.default_lang);
        let locale = locale_for_lang(lang);

        tracing::info!(city, ?route, units = query.units.as_str(), lang, "Resolved weather query");

        match route {
            Route::Current { .. } => {
                let snapshot = self.provider.current_weather(city, query.units, lang).await?;
                normalize_current(&snapshot, locale)
            }
            Route::Forecast { date: target } => {
                let location = self
                    .provider
                    .geocode(city)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))?;

                let samples = self.provider.forecast(&location, query.units, lang).await?;
                if samples.is_empty() {
                    return Err(WeatherError::NoForecastData);
                }

                let sample = select_sample(&samples, target, &Local).ok_or_else(|| {
                    WeatherError::DateNotInForecastData {
                        date: date::format_date(target),
                        available: available_dates(&samples, &Local, AVAILABLE_DATES_SHOWN)
                            .into_iter()
                            .map(date::format_date)
                            .collect(),
                    }
                })?;

                normalize_forecast(sample, &location.name, &location.country, locale)
            }
        }
    }
}
