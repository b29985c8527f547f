//! Configuration management for `Weathervane`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherError;
use crate::models::Location;
use crate::provider::{DEFAULT_BASE_URL, RetryConfig};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Longest history the provider serves in one call
const MAX_PAST_DAYS: u32 = 92;
/// Longest forecast horizon the provider serves
const MAX_FORECAST_DAYS: u32 = 16;

/// Root configuration structure for the `Weathervane` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherVaneConfig {
    /// Observed location
    #[serde(default)]
    pub location: LocationConfig,
    /// Weather provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The single location weather is fetched for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_location_name")]
    pub name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// IANA timezone the provider aggregates days in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the forecast API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Total attempts per fetch, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per retry
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
    /// Upper bound for any single retry delay
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,
    #[serde(default = "default_past_days")]
    pub past_days: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the record files
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
    /// Keep raw provider responses for `response_ttl_seconds`
    #[serde(default = "default_response_cache")]
    pub response_cache: bool,
    #[serde(default = "default_response_ttl")]
    pub response_ttl_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_location_name() -> String {
    "Louisville, KY".to_string()
}

fn default_latitude() -> f64 {
    38.2542
}

fn default_longitude() -> f64 {
    -85.7594
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base() -> u64 {
    200
}

fn default_backoff_max() -> u64 {
    10_000
}

fn default_past_days() -> u32 {
    crate::models::window::DEFAULT_PAST_DAYS
}

fn default_forecast_days() -> u32 {
    crate::models::window::DEFAULT_FORECAST_DAYS
}

fn default_cache_directory() -> PathBuf {
    dirs::cache_dir().map_or_else(|| PathBuf::from(".weathervane"), |dir| dir.join("weathervane"))
}

fn default_response_cache() -> bool {
    true
}

fn default_response_ttl() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: default_location_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            timezone: default_timezone(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            past_days: default_past_days(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            response_cache: default_response_cache(),
            response_ttl_seconds: default_response_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LocationConfig {
    #[must_use]
    pub fn to_location(&self) -> Location {
        Location::new(
            self.name.clone(),
            self.latitude,
            self.longitude,
            self.timezone.clone(),
        )
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

impl CacheConfig {
    /// Location of the HTTP response database, inside the cache directory
    #[must_use]
    pub fn response_dir(&self) -> PathBuf {
        self.directory.join("responses")
    }

    #[must_use]
    pub fn response_ttl(&self) -> Duration {
        Duration::from_secs(self.response_ttl_seconds)
    }
}

impl WeatherVaneConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.or_else(Self::get_config_path);
        if let Some(config_file) = config_file.filter(|path| path.exists()) {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERVANE_PROVIDER__MAX_ATTEMPTS=3
        builder = builder.add_source(
            Environment::with_prefix("WEATHERVANE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: WeatherVaneConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weathervane").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_provider()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        let location = &self.location;
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(WeatherError::config(format!(
                "Latitude must be between -90 and 90, got: {}",
                location.latitude
            ))
            .into());
        }

        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(WeatherError::config(format!(
                "Longitude must be between -180 and 180, got: {}",
                location.longitude
            ))
            .into());
        }

        if location.timezone.parse::<Tz>().is_err() {
            return Err(WeatherError::config(format!(
                "Unknown timezone '{}'",
                location.timezone
            ))
            .into());
        }

        Ok(())
    }

    fn validate_provider(&self) -> Result<()> {
        let provider = &self.provider;
        if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
            return Err(WeatherError::config(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if provider.timeout_seconds == 0 || provider.timeout_seconds > 300 {
            return Err(WeatherError::config(
                "Provider timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        if provider.max_attempts == 0 || provider.max_attempts > 10 {
            return Err(WeatherError::config(
                "Provider max attempts must be between 1 and 10",
            )
            .into());
        }

        if provider.backoff_base_ms > provider.backoff_max_ms {
            return Err(WeatherError::config(
                "Provider backoff base cannot exceed backoff max",
            )
            .into());
        }

        if provider.past_days > MAX_PAST_DAYS {
            return Err(WeatherError::config(format!(
                "Past days cannot exceed {MAX_PAST_DAYS}"
            ))
            .into());
        }

        if provider.forecast_days == 0 || provider.forecast_days > MAX_FORECAST_DAYS {
            return Err(WeatherError::config(format!(
                "Forecast days must be between 1 and {MAX_FORECAST_DAYS}"
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}
