//! Resolution of caller-supplied date tokens into calendar dates, and routing
//! of those dates to the current-weather or forecast path.
//!
//! All functions take "today" explicitly; [`today_local`] reads the clock.

use chrono::{Days, Local, NaiveDate};
use std::str::FromStr;

use crate::error::WeatherError;

/// How many days ahead the provider's forecast reaches.
pub const FORECAST_WINDOW_DAYS: i64 = 5;

/// A parsed `date` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    Today,
    Tomorrow,
    Explicit(NaiveDate),
}

impl DateToken {
    /// Parse an optional raw token; absent or empty means today.
    pub fn parse(raw: Option<&str>) -> Result<Self, WeatherError> {
        match raw {
            None | Some("") => Ok(DateToken::Today),
            Some(s) => s.parse(),
        }
    }

    /// Calendar date the token denotes, relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DateToken::Today => today,
            DateToken::Tomorrow => today.checked_add_days(Days::new(1)).unwrap_or(today),
            DateToken::Explicit(date) => *date,
        }
    }
}

impl FromStr for DateToken {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(DateToken::Today),
            "tomorrow" => Ok(DateToken::Tomorrow),
            _ => parse_iso_date(s).map(DateToken::Explicit),
        }
    }
}

/// Strict `YYYY-MM-DD`: four, two and two ASCII digits, and a real calendar date.
fn parse_iso_date(s: &str) -> Result<NaiveDate, WeatherError> {
    let invalid = || WeatherError::InvalidDateFormat(s.to_string());

    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let year: i32 = s[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = s[5..7].parse().map_err(|_| invalid())?;
    let day: u32 = s[8..10].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Resolve an optional raw token to a calendar date.
pub fn resolve(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, WeatherError> {
    DateToken::parse(raw).map(|token| token.resolve(today))
}

/// Today's date in the process' local timezone.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Where a resolved date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Past,
    CurrentDay,
    WithinForecastWindow,
    BeyondForecastWindow,
}

/// Classify by whole-day difference between `resolved` and `today`.
pub fn classify_range(resolved: NaiveDate, today: NaiveDate) -> DateRange {
    let diff = resolved.signed_duration_since(today).num_days();

    if diff < 0 {
        DateRange::Past
    } else if diff == 0 {
        DateRange::CurrentDay
    } else if diff <= FORECAST_WINDOW_DAYS {
        DateRange::WithinForecastWindow
    } else {
        DateRange::BeyondForecastWindow
    }
}

/// Which upstream flow serves a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Served by the current-conditions endpoint.
    Current { date: NaiveDate },
    /// Served by geocoding plus bucket selection from the 5-day forecast.
    Forecast { date: NaiveDate },
}

/// Parse, validate and route a raw date token.
///
/// Only an absent token or the literal `today` takes the current-weather path;
/// an explicit `YYYY-MM-DD` equal to today is served from the forecast.
pub fn plan(raw: Option<&str>, today: NaiveDate) -> Result<Route, WeatherError> {
    let token = DateToken::parse(raw)?;
    let date = token.resolve(today);

    match classify_range(date, today) {
        DateRange::Past => Err(WeatherError::PastDateNotSupported(format_date(date))),
        DateRange::BeyondForecastWindow => Err(WeatherError::ForecastHorizonExceeded {
            date: format_date(date),
            window: FORECAST_WINDOW_DAYS,
        }),
        DateRange::CurrentDay if token == DateToken::Today => Ok(Route::Current { date }),
        DateRange::CurrentDay | DateRange::WithinForecastWindow => Ok(Route::Forecast { date }),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
