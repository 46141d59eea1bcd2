use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LANG: &str = "pt_br";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// port = 3000
/// lang = "pt_br"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Port the HTTP service listens on.
    pub port: Option<u16>,

    /// Default provider language code when a request doesn't specify one.
    pub lang: Option<String>,

    /// Provider base URL, without a trailing slash.
    pub base_url: Option<String>,

    /// Per-call timeout for upstream requests.
    pub timeout_secs: Option<u64>,
}

/// Immutable settings the OpenWeather client is constructed from.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub lang: String,
    pub timeout: Duration,
}

impl Config {
    /// Load config from the platform config directory, or an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    /// Load config from an explicit path; a missing file yields the default config.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-api", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Layer values from flags or the environment over the file; empty strings are ignored.
    pub fn apply_overrides(
        &mut self,
        api_key: Option<String>,
        port: Option<u16>,
        lang: Option<String>,
    ) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if port.is_some() {
            self.port = port;
        }
        if let Some(lang) = lang.filter(|l| !l.trim().is_empty()) {
            self.lang = Some(lang);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or(DEFAULT_LANG)
    }

    /// Resolve the settings needed to talk to OpenWeather; fails without an API key.
    pub fn openweather(&self) -> Result<OpenWeatherConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: set OPENWEATHER_API_KEY or run `weather configure` and enter your API key."
                )
            })?;

        Ok(OpenWeatherConfig {
            api_key: api_key.to_string(),
            base_url: self
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            lang: self.lang().to_string(),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}
