//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG` if set, otherwise the configured level
#[must_use]
pub fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init(logging: &LoggingConfig) {
    let filter = env_filter(logging);
    let result = if logging.format == "json" {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if result.is_ok() {
        tracing::debug!("Logging initialised at level {}", logging.level);
    }
}
