use thiserror::Error;

/// Every way a weather-by-day query can fail.
///
/// Validation variants are raised before any upstream call is made; the
/// remaining ones come out of the provider or the post-processing of its data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("{0}")]
    MissingParameter(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("Invalid date format: '{0}'. Use 'today', 'tomorrow' or 'YYYY-MM-DD'")]
    InvalidDateFormat(String),

    #[error("Weather data for past dates is not available. Requested date: {0}")]
    PastDateNotSupported(String),

    #[error("The forecast is only available for the next {window} days. Requested date: {date}")]
    ForecastHorizonExceeded { date: String, window: i64 },

    #[error("City \"{0}\" not found")]
    CityNotFound(String),

    #[error("No forecast data available in the provider response")]
    NoForecastData,

    #[error(
        "Weather data is not available for the date: {date}. \
         Available dates: {}",
        .available.join(", ")
    )]
    DateNotInForecastData { date: String, available: Vec<String> },

    #[error("{message}")]
    UpstreamTransportFailure { status: Option<u16>, message: String },

    #[error("{0}")]
    UnclassifiedFailure(String),
}

impl WeatherError {
    /// Short, stable title for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::MissingParameter(_) => "Missing required parameter",
            WeatherError::InvalidParameter(_) => "Invalid parameter",
            WeatherError::InvalidDateFormat(_) => "Invalid date format",
            WeatherError::PastDateNotSupported(_) => "Past date not supported",
            WeatherError::ForecastHorizonExceeded { .. } => "Forecast horizon exceeded",
            WeatherError::CityNotFound(_) => "City not found",
            WeatherError::NoForecastData => "No forecast data",
            WeatherError::DateNotInForecastData { .. } => "Date not in forecast data",
            WeatherError::UpstreamTransportFailure { .. } => "Error fetching weather data",
            WeatherError::UnclassifiedFailure(_) => "Internal server error",
        }
    }

    /// Status code reported by the weather provider, if the failure came from it.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            WeatherError::UpstreamTransportFailure { status, .. } => *status,
            _ => None,
        }
    }

    /// True for failures caused by the caller's input rather than the provider.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WeatherError::MissingParameter(_)
                | WeatherError::InvalidParameter(_)
                | WeatherError::InvalidDateFormat(_)
                | WeatherError::PastDateNotSupported(_)
                | WeatherError::ForecastHorizonExceeded { .. }
        )
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::UpstreamTransportFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
