//! `Weathervane` - daily and hourly weather for a fixed location
//!
//! This library fetches weather from `OpenMeteo` with bounded retries, keeps
//! a same-day CSV cache per unit system, evicts stale cache entries, and
//! falls back to synthetic daily data when the provider cannot be used.

pub mod config;
pub mod error;
pub mod http_cache;
pub mod janitor;
pub mod models;
pub mod provider;
pub mod service;
pub mod store;
pub mod summary;
pub mod synthetic;
pub mod telemetry;
pub mod units;

// Re-export core types for public API
pub use config::WeatherVaneConfig;
pub use error::WeatherError;
pub use janitor::{CacheJanitor, SweepReport};
pub use models::{DailyRecord, FetchWindow, Granularity, HourlyRecord, Location};
pub use provider::{ProviderClient, RetryConfig};
pub use service::{DataOrigin, WeatherService, WeatherSession, WeatherSnapshot};
pub use store::{CacheKey, CacheStore};
pub use summary::{DailyField, DaySummary, Distribution};
pub use units::{UnitProfile, UnitSystem, resolve};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
