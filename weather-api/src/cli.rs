use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::{path::PathBuf, sync::Arc};
use weather_core::{
    Config, NormalizedWeatherReport, Units, WeatherQuery, WeatherService, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather-by-day API")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, env = "WEATHER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// OpenWeather API key; overrides the config file.
    #[arg(long, env = "OPENWEATHER_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default language code, e.g. "pt_br" or "en".
    #[arg(long, env = "WEATHER_LANG", global = true)]
    pub lang: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default language.
    Configure,

    /// Run the HTTP service.
    Serve {
        /// Port to listen on.
        #[arg(long, short, env = "PORT")]
        port: Option<u16>,
    },

    /// Show the weather for a city once.
    Show {
        /// City name.
        city: String,

        /// "today", "tomorrow" or YYYY-MM-DD; if absent, means today.
        #[arg(long)]
        date: Option<String>,

        /// "metric", "imperial" or "kelvin".
        #[arg(long, default_value = "metric")]
        units: String,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Configure => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                configure(&mut config)?;
                config.save_to(&path)?;
                println!("Configuration saved to {}", path.display());
            }
            Command::Serve { port } => {
                config.apply_overrides(self.api_key, port, self.lang);
                let service = build_service(&config)?;
                crate::server::run(config.port(), Arc::new(service)).await?;
            }
            Command::Show { city, date, units, json } => {
                config.apply_overrides(self.api_key, None, self.lang);
                let service = build_service(&config)?;

                let query = WeatherQuery {
                    city,
                    date,
                    units: units.parse::<Units>()?,
                    lang: None,
                };
                let report = service.weather_by_day(&query).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_report(&report, query.units);
                }
            }
        }

        Ok(())
    }
}

/// Fails when no API key is configured, so nothing starts without one.
fn build_service(config: &Config) -> anyhow::Result<WeatherService> {
    let ow = config.openweather()?;
    let provider = provider_from_config(&ow).context("Failed to build OpenWeather client")?;
    Ok(WeatherService::new(provider, ow.lang))
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key.trim().to_string());

    let lang = Text::new("Default language:").with_default(config.lang()).prompt()?;
    config.apply_overrides(None, None, Some(lang.trim().to_string()));

    Ok(())
}

fn print_report(report: &NormalizedWeatherReport, units: Units) {
    let (deg, speed) = match units {
        Units::Metric => ("°C", "m/s"),
        Units::Imperial => ("°F", "mph"),
        Units::Kelvin => ("K", "m/s"),
    };
    let t = &report.temperature;

    println!("{}, {}: {} ({})", report.city, report.country, report.day_of_week, report.date);
    println!("  {} ({})", report.weather.description, report.weather.main);
    println!(
        "  Temperature: {}{deg} (feels like {}{deg}), min {}{deg}, max {}{deg}",
        t.current, t.feels_like, t.min, t.max
    );
    println!("  Humidity: {}%  Pressure: {} hPa  Clouds: {}%", report.humidity, report.pressure, report.clouds);
    println!("  Wind: {} {speed} from {}°", report.wind.speed, report.wind.direction);
    if let Some(km) = report.visibility {
        println!("  Visibility: {km} km");
    }
    println!("  Chance of precipitation: {}%", report.precipitation_probability);
}
