//! Weather provider client for `OpenMeteo`
//!
//! One fetch retrieves the daily and hourly series for the whole window in a
//! single request. Transient failures (network errors, non-2xx statuses,
//! unparseable bodies) are retried with exponential backoff; a payload that
//! parses but does not line up with the window is reported immediately.
//!
//! An optional [`ResponseCache`] is consulted before the network and only
//! ever receives bodies that decoded successfully.

pub mod decode;
pub mod transport;

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use reqwest::StatusCode;
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryDecision, RetryPolicy};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::http_cache::ResponseCache;
use crate::models::{DAILY_VARIABLES, FetchWindow, HOURLY_VARIABLES, Location};
use crate::units::UnitProfile;
use crate::{Result, WeatherError};

pub use decode::{ForecastResponse, ProviderFrames};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

/// Retry budget for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(200),
            backoff_max: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    fn policy(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.backoff_base, self.backoff_max.max(self.backoff_base))
            .jitter(Jitter::None)
            .base(2)
            .build_with_max_retries(self.max_attempts.saturating_sub(1))
    }
}

/// Why a single attempt failed; every variant is retried
#[derive(Error, Debug)]
enum AttemptError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("unparseable payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct ProviderClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    retry: RetryConfig,
    response_cache: Option<ResponseCache>,
}

impl ProviderClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            response_cache: None,
        }
    }

    #[must_use]
    pub fn with_response_cache(mut self, cache: ResponseCache) -> Self {
        self.response_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        self.retry
    }

    /// Request URL for a fetch. Parameter order is fixed so the URL doubles
    /// as the response cache signature.
    #[must_use]
    pub fn request_url(&self, location: &Location, profile: &UnitProfile, window: &FetchWindow) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}&daily={}&hourly={}&timezone={}&timeformat=unixtime&past_days={}&forecast_days={}&temperature_unit={}&wind_speed_unit={}&precipitation_unit={}",
            self.base_url,
            location.latitude,
            location.longitude,
            DAILY_VARIABLES.join(","),
            HOURLY_VARIABLES.join(","),
            urlencoding::encode(&location.timezone),
            window.past_days,
            window.forecast_days,
            profile.temperature().query_value(),
            profile.wind().query_value(),
            profile.precipitation().query_value(),
        )
    }

    /// Fetch daily and hourly records covering `window`.
    ///
    /// # Errors
    ///
    /// - [`WeatherError::ProviderUnavailable`] once every attempt failed
    /// - [`WeatherError::DecodeMismatch`] if a parsed payload does not cover
    ///   the window exactly
    #[instrument(skip(self, location, window), fields(units = %profile.system(), start = %window.start(), days = window.len()))]
    pub async fn fetch(
        &self,
        location: &Location,
        profile: &UnitProfile,
        window: &FetchWindow,
    ) -> Result<ProviderFrames> {
        let url = self.request_url(location, profile, window);
        debug!("OpenMeteo request URL: {}", url);

        if let Some(response) = self.cached_response(&url).await {
            match decode::decode(&response, window) {
                Ok(frames) => {
                    info!("Using cached provider response for {}", location.name);
                    return Ok(frames);
                }
                Err(e) => {
                    warn!("Discarding cached provider response: {}", e);
                    self.forget(&url).await;
                }
            }
        }

        let (response, body) = self.request_with_retry(&url).await?;
        let frames = decode::decode(&response, window)?;
        self.remember(&url, body).await;

        info!(
            "Fetched {} daily and {} hourly records for {}",
            frames.daily.len(),
            frames.hourly.len(),
            location.name
        );
        Ok(frames)
    }

    async fn request_with_retry(&self, url: &str) -> Result<(ForecastResponse, Vec<u8>)> {
        let max_attempts = self.retry.max_attempts;
        let policy = self.retry.policy();
        let started = SystemTime::now();
        let request_start = Instant::now();
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max_attempts {
            match self.attempt(url).await {
                Ok(result) => {
                    info!(
                        "Provider responded in {:.3}s (attempt {}/{})",
                        request_start.elapsed().as_secs_f64(),
                        attempt,
                        max_attempts
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!("Provider attempt {}/{} failed: {}", attempt, max_attempts, e);
                    last_error = e.to_string();
                }
            }

            if attempt == max_attempts {
                break;
            }
            if let RetryDecision::Retry { execute_after } = policy.should_retry(started, attempt - 1) {
                let delay = execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or_default();
                debug!("Backing off {:.3}s before retry", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }

        error!("Provider unavailable after {} attempt(s): {}", max_attempts, last_error);
        Err(WeatherError::ProviderUnavailable {
            attempts: max_attempts,
            reason: last_error,
        })
    }

    async fn attempt(&self, url: &str) -> std::result::Result<(ForecastResponse, Vec<u8>), AttemptError> {
        let response = self.transport.get(url).await?;
        if !response.status.is_success() {
            return Err(AttemptError::Status(response.status));
        }
        let parsed = serde_json::from_slice(&response.body)?;
        Ok((parsed, response.body))
    }

    async fn cached_response(&self, url: &str) -> Option<ForecastResponse> {
        let cache = self.response_cache.as_ref()?;
        let body = match cache.get(url).await {
            Ok(body) => body?,
            Err(e) => {
                warn!("Response cache lookup failed: {}", e);
                return None;
            }
        };
        match serde_json::from_slice(&body) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Discarding unparseable cached response: {}", e);
                self.forget(url).await;
                None
            }
        }
    }

    async fn remember(&self, url: &str, body: Vec<u8>) {
        if let Some(cache) = &self.response_cache {
            if let Err(e) = cache.put(url, body).await {
                warn!("Failed to cache provider response: {}", e);
            }
        }
    }

    async fn forget(&self, url: &str) {
        if let Some(cache) = &self.response_cache {
            if let Err(e) = cache.remove(url).await {
                warn!("Failed to evict cached provider response: {}", e);
            }
        }
    }
}
