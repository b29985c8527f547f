//! Error types and handling for `Weathervane`

use thiserror::Error;

use crate::models::Granularity;

/// Main error type for the `Weathervane` library
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Unit system selector was neither `imperial` nor `metric`
    #[error("Invalid unit system '{value}': expected 'imperial' or 'metric'")]
    InvalidUnitSystem { value: String },

    /// Provider could not be reached after the retry budget was spent
    #[error("Weather provider unavailable after {attempts} attempt(s): {reason}")]
    ProviderUnavailable { attempts: u32, reason: String },

    /// Provider payload did not line up with the requested window
    #[error("Provider payload mismatch for {granularity} data: {reason}")]
    DecodeMismatch {
        granularity: Granularity,
        reason: String,
    },

    /// No cache entry exists for the key
    #[error("Cache miss: {key}")]
    CacheMiss { key: String },

    /// A cache entry exists but cannot be read back
    #[error("Corrupt cache entry {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new decode mismatch error
    pub fn decode_mismatch<S: Into<String>>(granularity: Granularity, reason: S) -> Self {
        Self::DecodeMismatch {
            granularity,
            reason: reason.into(),
        }
    }

    /// Create a new corrupt cache entry error
    pub fn cache_corrupt<K: Into<String>, S: Into<String>>(key: K, reason: S) -> Self {
        Self::CacheCorrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure should be absorbed by synthetic fallback data.
    ///
    /// Only provider-side failures qualify; everything else is surfaced.
    #[must_use]
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            WeatherError::ProviderUnavailable { .. } | WeatherError::DecodeMismatch { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::InvalidUnitSystem { value } => {
                format!("Unknown unit system '{value}'. Use 'imperial' or 'metric'.")
            }
            WeatherError::ProviderUnavailable { .. } | WeatherError::DecodeMismatch { .. } => {
                "Unable to get live weather data. Showing generated sample data instead."
                    .to_string()
            }
            WeatherError::CacheMiss { .. } => "No cached weather data for today.".to_string(),
            WeatherError::CacheCorrupt { .. } => {
                "Cached weather data is unreadable and will be fetched again.".to_string()
            }
            WeatherError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            WeatherError::Io { .. } => {
                "File operation failed. Please check cache directory permissions.".to_string()
            }
        }
    }
}
