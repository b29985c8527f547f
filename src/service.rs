//! Cache-first weather retrieval
//!
//! [`WeatherService::get_or_fetch`] serves today's entries from the
//! [`CacheStore`] when both granularities are present, otherwise fetches
//! from the provider and persists the result. When the provider fails in
//! one of the recoverable ways, synthetic daily data is served instead.
//!
//! [`WeatherSession`] keeps the snapshot currently in use so repeated
//! requests for the same unit system and day do not touch the disk.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherVaneConfig;
use crate::http_cache::ResponseCache;
use crate::janitor::{CacheJanitor, SweepReport};
use crate::models::{DailyRecord, FetchWindow, HourlyRecord, Location};
use crate::provider::{HttpTransport, ProviderClient};
use crate::store::{CacheKey, CacheStore};
use crate::synthetic;
use crate::units::{UnitProfile, UnitSystem};
use crate::{Result, WeatherError};

/// Where a snapshot's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Provider,
    /// Generated locally; not real weather
    Synthetic,
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataOrigin::Cache => "cache",
            DataOrigin::Provider => "provider",
            DataOrigin::Synthetic => "synthetic",
        })
    }
}

/// Daily and hourly records for one unit system, as of one fetch day
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub profile: UnitProfile,
    pub fetched_on: NaiveDate,
    pub origin: DataOrigin,
    pub daily: Vec<DailyRecord>,
    /// Empty when `origin` is [`DataOrigin::Synthetic`]
    pub hourly: Vec<HourlyRecord>,
}

pub struct WeatherService {
    location: Location,
    provider: ProviderClient,
    store: CacheStore,
    janitor: CacheJanitor,
    past_days: u32,
    forecast_days: u32,
    rng: StdRng,
}

impl WeatherService {
    #[must_use]
    pub fn new(location: Location, provider: ProviderClient, store: CacheStore) -> Self {
        Self {
            location,
            provider,
            janitor: CacheJanitor::new(store.clone()),
            store,
            past_days: crate::models::window::DEFAULT_PAST_DAYS,
            forecast_days: crate::models::window::DEFAULT_FORECAST_DAYS,
            rng: StdRng::seed_from_u64(rand::rng().random()),
        }
    }

    /// Build the service described by `config` with the real HTTP transport.
    ///
    /// # Errors
    ///
    /// [`WeatherError::Config`] if the HTTP client cannot be set up,
    /// [`WeatherError::Io`] if the cache directory cannot be created. A
    /// response cache that fails to open is logged and left out.
    pub fn from_config(config: &WeatherVaneConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.provider.timeout())
            .map_err(|e| WeatherError::config(format!("Failed to create HTTP client: {e}")))?;
        let mut provider = ProviderClient::new(
            Arc::new(transport),
            config.provider.base_url.clone(),
            config.provider.retry(),
        );

        if config.cache.response_cache {
            match ResponseCache::open(config.cache.response_dir(), config.cache.response_ttl()) {
                Ok(cache) => provider = provider.with_response_cache(cache),
                Err(e) => warn!("Response cache unavailable, continuing without it: {:#}", e),
            }
        }

        let store = CacheStore::open(&config.cache.directory)?;
        Ok(Self::new(config.location.to_location(), provider, store)
            .with_window_days(config.provider.past_days, config.provider.forecast_days))
    }

    #[must_use]
    pub fn with_window_days(mut self, past_days: u32, forecast_days: u32) -> Self {
        self.past_days = past_days;
        self.forecast_days = forecast_days;
        self
    }

    /// Replace the random source used for synthetic data
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Window requested for a fetch made on `today`
    #[must_use]
    pub fn window(&self, today: NaiveDate) -> FetchWindow {
        FetchWindow::new(today, self.past_days, self.forecast_days)
    }

    /// Records for `system` as of `today`: cached, fetched, or synthetic.
    ///
    /// # Errors
    ///
    /// Provider failures never surface here. Cache write failures and any
    /// other unexpected error are returned.
    #[instrument(skip(self), fields(location = %self.location.name))]
    pub async fn get_or_fetch(&mut self, system: UnitSystem, today: NaiveDate) -> Result<WeatherSnapshot> {
        let profile = UnitProfile::for_system(system);
        let (daily_key, hourly_key) = CacheKey::pair(today, system);

        let window = self.window(today);
        if let Some((daily, hourly)) = self.load_cached(&daily_key, &hourly_key, &window)? {
            info!("Loading {} data from cache", system);
            return Ok(WeatherSnapshot {
                profile,
                fetched_on: today,
                origin: DataOrigin::Cache,
                daily,
                hourly,
            });
        }

        info!("Fetching data for {} units", system);
        match self.provider.fetch(&self.location, &profile, &window).await {
            Ok(frames) => {
                self.store.save(&daily_key, &frames.daily)?;
                self.store.save(&hourly_key, &frames.hourly)?;
                if let Err(e) = self.janitor.sweep(today) {
                    warn!("Cache sweep failed: {}", e);
                }
                Ok(WeatherSnapshot {
                    profile,
                    fetched_on: today,
                    origin: DataOrigin::Provider,
                    daily: frames.daily,
                    hourly: frames.hourly,
                })
            }
            Err(e) if e.triggers_fallback() => {
                warn!("Falling back to synthetic data: {}", e);
                let daily = synthetic::synthesize(&profile, &window, &mut self.rng);
                self.store.save(&daily_key, &daily)?;
                Ok(WeatherSnapshot {
                    profile,
                    fetched_on: today,
                    origin: DataOrigin::Synthetic,
                    daily,
                    hourly: Vec::new(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Run the janitor for `today`
    ///
    /// # Errors
    ///
    /// Only if the cache directory cannot be enumerated.
    pub fn sweep(&self, today: NaiveDate) -> Result<SweepReport> {
        self.janitor.sweep(today)
    }

    fn load_cached(
        &self,
        daily_key: &CacheKey,
        hourly_key: &CacheKey,
        window: &FetchWindow,
    ) -> Result<Option<(Vec<DailyRecord>, Vec<HourlyRecord>)>> {
        if !(self.store.exists(daily_key) && self.store.exists(hourly_key)) {
            debug!("No complete cache entry for {}", daily_key.fetch_date);
            return Ok(None);
        }

        let loaded = self
            .store
            .load::<DailyRecord>(daily_key)
            .and_then(|daily| Ok((daily, self.store.load::<HourlyRecord>(hourly_key)?)))
            .and_then(|(daily, hourly)| {
                check_coverage(&daily, &hourly, window, daily_key, hourly_key)?;
                Ok((daily, hourly))
            });

        match loaded {
            Ok(records) => Ok(Some(records)),
            Err(e @ (WeatherError::CacheCorrupt { .. } | WeatherError::CacheMiss { .. })) => {
                warn!("Ignoring cache entry: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// A cached pair must cover `window` exactly: one daily row per day in
/// order, and 24 hourly rows per day.
fn check_coverage(
    daily: &[DailyRecord],
    hourly: &[HourlyRecord],
    window: &FetchWindow,
    daily_key: &CacheKey,
    hourly_key: &CacheKey,
) -> Result<()> {
    if !daily.iter().map(|r| r.date).eq(window.dates()) {
        return Err(WeatherError::cache_corrupt(
            daily_key.file_name(),
            format!(
                "{} daily rows do not cover {} days from {}",
                daily.len(),
                window.len(),
                window.start()
            ),
        ));
    }

    let expected = window.len() * 24;
    if hourly.len() != expected {
        return Err(WeatherError::cache_corrupt(
            hourly_key.file_name(),
            format!("expected {} hourly rows, found {}", expected, hourly.len()),
        ));
    }
    Ok(())
}

/// The snapshot currently in use, plus the service that produces new ones
pub struct WeatherSession {
    service: WeatherService,
    current: Option<WeatherSnapshot>,
}

impl WeatherSession {
    #[must_use]
    pub fn new(service: WeatherService) -> Self {
        Self {
            service,
            current: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&WeatherSnapshot> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn service(&self) -> &WeatherService {
        &self.service
    }

    /// Make `system` as of `today` the current snapshot.
    ///
    /// The current snapshot is reused if it already matches; on error the
    /// previous snapshot is kept.
    ///
    /// # Errors
    ///
    /// Whatever [`WeatherService::get_or_fetch`] returns.
    pub async fn select(&mut self, system: UnitSystem, today: NaiveDate) -> Result<&WeatherSnapshot> {
        match self.current.take() {
            Some(snapshot) if snapshot.profile.system() == system && snapshot.fetched_on == today => {
                debug!("Reusing in-memory {} snapshot", system);
                Ok(self.current.insert(snapshot))
            }
            previous => match self.service.get_or_fetch(system, today).await {
                Ok(snapshot) => Ok(self.current.insert(snapshot)),
                Err(e) => {
                    self.current = previous;
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Granularity;
    use crate::provider::RawResponse;
    use crate::provider::testing::*;
    use crate::synthetic::SyntheticRanges;
    use chrono::Days;
    use rstest::rstest;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn service(dir: &TempDir, transport: Arc<ScriptedTransport>) -> WeatherService {
        let provider = ProviderClient::new(transport, "http://provider.test/v1", fast_retry());
        let store = CacheStore::open(dir.path()).unwrap();
        WeatherService::new(Location::louisville(), provider, store).with_rng(StdRng::seed_from_u64(42))
    }

    #[tokio::test]
    async fn test_miss_fetches_and_persists() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window)]);
        let mut service = service(&dir, transport.clone());
        let (daily_key, hourly_key) = CacheKey::pair(today(), UnitSystem::Imperial);

        assert!(!service.store().exists(&daily_key));
        let snapshot = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert_eq!(snapshot.origin, DataOrigin::Provider);
        assert_eq!(snapshot.daily.len(), 38);
        assert!(service.store().exists(&daily_key));
        assert_eq!(service.store().load::<DailyRecord>(&daily_key).unwrap(), snapshot.daily);
        assert_eq!(service.store().load::<HourlyRecord>(&hourly_key).unwrap(), snapshot.hourly);
    }

    #[tokio::test]
    async fn test_hit_skips_provider() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window)]);
        let mut service = service(&dir, transport.clone());

        let fetched = service.get_or_fetch(UnitSystem::Metric, today()).await.unwrap();
        let cached = service.get_or_fetch(UnitSystem::Metric, today()).await.unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(cached.origin, DataOrigin::Cache);
        assert_eq!(cached.daily, fetched.daily);
        assert_eq!(cached.hourly, fetched.hourly);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_synthetic() {
        let dir = TempDir::new().unwrap();
        let transport = ScriptedTransport::failing();
        let mut service = service(&dir, transport.clone());

        let snapshot = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert_eq!(transport.calls(), 5);
        assert_eq!(snapshot.origin, DataOrigin::Synthetic);
        assert!(snapshot.hourly.is_empty());
        assert_eq!(snapshot.daily.len(), service.window(today()).len());
        let ranges = SyntheticRanges::for_profile(&UnitProfile::IMPERIAL);
        assert!(snapshot.daily.iter().all(|r| ranges.admits(r)));

        let (daily_key, hourly_key) = CacheKey::pair(today(), UnitSystem::Imperial);
        assert!(service.store().exists(&daily_key));
        assert!(!service.store().exists(&hourly_key));
    }

    #[tokio::test]
    async fn test_decode_mismatch_falls_back() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let short = serde_json::to_vec(&payload_with_rows(&window, 10)).unwrap();
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::ok(short))]);
        let mut service = service(&dir, transport.clone());

        let snapshot = service.get_or_fetch(UnitSystem::Metric, today()).await.unwrap();
        assert_eq!(snapshot.origin, DataOrigin::Synthetic);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_synthetic_daily_alone_is_not_a_hit() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![
            unreachable(),
            unreachable(),
            unreachable(),
            unreachable(),
            unreachable(),
            success(&window),
        ]);
        let mut service = service(&dir, transport.clone());

        let first = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();
        let second = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert_eq!(first.origin, DataOrigin::Synthetic);
        assert_eq!(second.origin, DataOrigin::Provider);
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_refetched() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window)]);
        let mut service = service(&dir, transport.clone());
        let (daily_key, hourly_key) = CacheKey::pair(today(), UnitSystem::Imperial);
        std::fs::write(service.store().path_for(&daily_key), "garbage\n1,2,3\n").unwrap();
        service.store().save::<HourlyRecord>(&hourly_key, &[]).unwrap();

        let snapshot = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert_eq!(snapshot.origin, DataOrigin::Provider);
        assert_eq!(transport.calls(), 1);
        assert_eq!(service.store().load::<DailyRecord>(&daily_key).unwrap().len(), 38);
    }

    #[test]
    fn test_unusable_response_cache_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut config = WeatherVaneConfig::default();
        config.cache.directory = dir.path().to_path_buf();
        config.cache.response_cache = true;
        std::fs::write(config.cache.response_dir(), "not a database").unwrap();

        let service = WeatherService::from_config(&config).unwrap();

        assert!(service.store().root().is_dir());
        assert!(service.store().root().join("responses").is_file());
    }

    #[rstest]
    #[case::daily(Granularity::Daily)]
    #[case::hourly(Granularity::Hourly)]
    #[tokio::test]
    async fn test_truncated_entry_is_refetched(#[case] granularity: Granularity) {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window), success(&window)]);
        let mut service = service(&dir, transport.clone());
        service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        let path = service
            .store()
            .path_for(&CacheKey::new(today(), UnitSystem::Imperial, granularity));
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        let kept = lines[..lines.len() - 5].join("\n") + "\n";
        std::fs::write(&path, kept).unwrap();

        let snapshot = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert_eq!(snapshot.origin, DataOrigin::Provider);
        assert_eq!(transport.calls(), 2);
        assert_eq!(snapshot.daily.len(), window.len());
        assert_eq!(snapshot.hourly.len(), window.len() * 24);
        let (daily_key, hourly_key) = CacheKey::pair(today(), UnitSystem::Imperial);
        assert_eq!(service.store().load::<DailyRecord>(&daily_key).unwrap().len(), 38);
        assert_eq!(service.store().load::<HourlyRecord>(&hourly_key).unwrap().len(), 38 * 24);
    }

    #[tokio::test]
    async fn test_fresh_fetch_sweeps_stale_entries() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window)]);
        let mut service = service(&dir, transport);
        let stale = CacheKey::new(today() - Days::new(1), UnitSystem::Metric, Granularity::Hourly);
        service.store().save::<HourlyRecord>(&stale, &[]).unwrap();

        service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

        assert!(!service.store().exists(&stale));
    }

    #[tokio::test]
    async fn test_session_reuses_and_switches() {
        let dir = TempDir::new().unwrap();
        let window = FetchWindow::around(today());
        let transport = ScriptedTransport::new(vec![success(&window), success(&window)]);
        let mut session = WeatherSession::new(service(&dir, transport.clone()));

        let first = session.select(UnitSystem::Imperial, today()).await.unwrap().clone();
        let again = session.select(UnitSystem::Imperial, today()).await.unwrap().clone();
        assert_eq!(first, again);
        assert_eq!(transport.calls(), 1);

        let metric = session.select(UnitSystem::Metric, today()).await.unwrap();
        assert_eq!(metric.profile, UnitProfile::METRIC);
        assert_eq!(transport.calls(), 2);
        assert_eq!(session.current().map(|s| s.profile.system()), Some(UnitSystem::Metric));
    }
}
