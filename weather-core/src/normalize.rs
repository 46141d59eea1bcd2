//! Maps current-conditions snapshots and forecast buckets into
//! [`NormalizedWeatherReport`].

use chrono::{DateTime, Locale, Utc};

use crate::{
    error::WeatherError,
    model::{
        CurrentWeatherSnapshot, ForecastSample, NormalizedWeatherReport, Reading, TemperatureBlock,
        WindBlock,
    },
};

/// What a report is built from.
#[derive(Debug, Clone, Copy)]
pub enum WeatherSource<'a> {
    Forecast(&'a ForecastSample),
    Current(&'a CurrentWeatherSnapshot),
}

impl WeatherSource<'_> {
    fn reading(&self) -> &Reading {
        match self {
            WeatherSource::Forecast(sample) => &sample.reading,
            WeatherSource::Current(snapshot) => &snapshot.reading,
        }
    }

    /// Whole-number percentage; the current-conditions endpoint reports none.
    fn precipitation_percent(&self) -> i64 {
        match self {
            WeatherSource::Forecast(sample) => (sample.pop * 100.0).round() as i64,
            WeatherSource::Current(_) => 0,
        }
    }
}

/// Locale used for the day-of-week name, from a provider language code.
pub fn locale_for_lang(lang: &str) -> Locale {
    match lang.to_ascii_lowercase().as_str() {
        "pt_br" | "pt" => Locale::pt_BR,
        "es" | "sp" => Locale::es_ES,
        "fr" => Locale::fr_FR,
        "de" => Locale::de_DE,
        "it" => Locale::it_IT,
        _ => Locale::en_US,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the uniform report.
///
/// `date` and `dayOfWeek` come from the source timestamp's UTC calendar date,
/// not the local one used when selecting the bucket.
pub fn normalize(
    source: WeatherSource<'_>,
    city: &str,
    country: &str,
    locale: Locale,
) -> Result<NormalizedWeatherReport, WeatherError> {
    let reading = source.reading();

    let instant: DateTime<Utc> = DateTime::from_timestamp(reading.timestamp, 0).ok_or_else(|| {
        WeatherError::UnclassifiedFailure(format!(
            "Provider returned an out-of-range timestamp: {}",
            reading.timestamp
        ))
    })?;

    let day_of_week = capitalize(&instant.format_localized("%A", locale).to_string());

    Ok(NormalizedWeatherReport {
        date: instant.format("%Y-%m-%d").to_string(),
        day_of_week,
        city: city.to_string(),
        country: country.to_string(),
        temperature: TemperatureBlock {
            min: reading.temp_min.round() as i64,
            max: reading.temp_max.round() as i64,
            current: reading.temp.round() as i64,
            feels_like: reading.feels_like.round() as i64,
        },
        weather: reading.condition.clone(),
        humidity: reading.humidity.round() as i64,
        pressure: reading.pressure.round() as i64,
        wind: WindBlock {
            speed: reading.wind_speed,
            direction: reading.wind_deg.round() as i64,
        },
        clouds: reading.clouds.round() as i64,
        visibility: reading.visibility.map(|meters| meters / 1000.0),
        precipitation_probability: source.precipitation_percent(),
    })
}

/// Normalize a forecast bucket for a geocoded city.
pub fn normalize_forecast(
    sample: &ForecastSample,
    city: &str,
    country: &str,
    locale: Locale,
) -> Result<NormalizedWeatherReport, WeatherError> {
    normalize(WeatherSource::Forecast(sample), city, country, locale)
}

/// Normalize a current-conditions snapshot; city and country come from the snapshot.
pub fn normalize_current(
    snapshot: &CurrentWeatherSnapshot,
    locale: Locale,
) -> Result<NormalizedWeatherReport, WeatherError> {
    normalize(WeatherSource::Current(snapshot), &snapshot.city, &snapshot.country, locale)
}
