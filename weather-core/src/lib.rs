//! Core library for the weather-by-day API.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Date token resolution and forecast-window routing
//! - Forecast bucket selection and report normalization
//! - Abstraction over the upstream weather provider
//!
//! It is used by `weather-api`, which serves it over HTTP and the terminal.

pub mod config;
pub mod date;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod select;
pub mod service;

pub use config::{Config, OpenWeatherConfig};
pub use error::WeatherError;
pub use model::{NormalizedWeatherReport, Units, WeatherQuery};
pub use provider::{WeatherProvider, provider_from_config};
pub use service::WeatherService;
