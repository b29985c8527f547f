//! End-to-end tests against a mock `OpenMeteo` server

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weathervane::models::{DAILY_VARIABLES, Granularity};
use weathervane::{
    CacheKey, DailyRecord, DataOrigin, FetchWindow, HourlyRecord, UnitSystem, WeatherService,
    WeatherSession, WeatherVaneConfig,
};

const UTC_OFFSET: i64 = -4 * 3600;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn midnight(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() - UTC_OFFSET
}

fn payload(window: &FetchWindow, daily_rows: usize) -> Value {
    let start = midnight(window.start());
    let hours = window.len() as i64 * 24;

    let mut daily = serde_json::Map::new();
    daily.insert(
        "time".into(),
        json!((0..daily_rows as i64).map(|d| start + d * 86_400).collect::<Vec<_>>()),
    );
    for name in DAILY_VARIABLES {
        daily.insert(name.into(), json!(vec![12.346_f64; daily_rows]));
    }

    json!({
        "latitude": 38.25,
        "longitude": -85.75,
        "utc_offset_seconds": UTC_OFFSET,
        "timezone": "America/New_York",
        "daily": Value::Object(daily),
        "hourly": {
            "time": (0..hours).map(|h| start + h * 3_600).collect::<Vec<_>>(),
            "temperature_2m": (0..hours).map(|h| 10.0 + (h % 24) as f64 / 3.0).collect::<Vec<_>>(),
        },
    })
}

fn config(server: &MockServer, cache_dir: &TempDir, response_cache: bool) -> WeatherVaneConfig {
    let mut config = WeatherVaneConfig::default();
    config.provider.base_url = format!("{}/v1", server.uri());
    config.provider.timeout_seconds = 5;
    config.provider.backoff_base_ms = 1;
    config.provider.backoff_max_ms = 4;
    config.cache.directory = cache_dir.path().to_path_buf();
    config.cache.response_cache = response_cache;
    config
}

#[tokio::test]
async fn test_miss_fetch_persist_then_hit() {
    let server = MockServer::start().await;
    let window = FetchWindow::around(today());
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("timeformat", "unixtime"))
        .and(query_param("past_days", "31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(&window, window.len())))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = WeatherService::from_config(&config(&server, &dir, false)).unwrap();
    let (daily_key, hourly_key) = CacheKey::pair(today(), UnitSystem::Imperial);
    assert!(!service.store().exists(&daily_key));

    let fetched = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();
    assert_eq!(fetched.origin, DataOrigin::Provider);
    assert_eq!(fetched.daily.len(), 38);
    assert_eq!(fetched.hourly.len(), 38 * 24);
    assert!(fetched.daily.iter().all(|r| r.temperature_max == Some(12.35)));
    assert!(service.store().exists(&daily_key));
    assert_eq!(service.store().load::<DailyRecord>(&daily_key).unwrap(), fetched.daily);
    assert_eq!(service.store().load::<HourlyRecord>(&hourly_key).unwrap(), fetched.hourly);

    let cached = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();
    assert_eq!(cached.origin, DataOrigin::Cache);
    assert_eq!(cached.daily, fetched.daily);
}

#[tokio::test]
async fn test_server_errors_fall_back_to_synthetic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = WeatherService::from_config(&config(&server, &dir, false)).unwrap();

    let snapshot = service.get_or_fetch(UnitSystem::Metric, today()).await.unwrap();
    assert_eq!(snapshot.origin, DataOrigin::Synthetic);
    assert_eq!(snapshot.daily.len(), service.window(today()).len());
    assert!(snapshot.hourly.is_empty());
    assert!(snapshot
        .daily
        .iter()
        .all(|r| r.temperature_max.is_some_and(|t| (15.0..=32.0).contains(&t))));
}

#[tokio::test]
async fn test_short_payload_is_not_retried() {
    let server = MockServer::start().await;
    let window = FetchWindow::around(today());
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(&window, 37)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = WeatherService::from_config(&config(&server, &dir, false)).unwrap();

    let snapshot = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();
    assert_eq!(snapshot.origin, DataOrigin::Synthetic);
}

#[tokio::test]
async fn test_response_cache_serves_refetch() {
    let server = MockServer::start().await;
    let window = FetchWindow::around(today());
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload(&window, window.len())))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut service = WeatherService::from_config(&config(&server, &dir, true)).unwrap();

    let first = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();
    for granularity in [Granularity::Daily, Granularity::Hourly] {
        let key = CacheKey::new(today(), UnitSystem::Imperial, granularity);
        std::fs::remove_file(service.store().path_for(&key)).unwrap();
    }
    let second = service.get_or_fetch(UnitSystem::Imperial, today()).await.unwrap();

    assert_eq!(second.origin, DataOrigin::Provider);
    assert_eq!(first.daily, second.daily);
}

#[tokio::test]
async fn test_session_switches_unit_system() {
    let server = MockServer::start().await;
    let window = FetchWindow::around(today());
    for unit in ["fahrenheit", "celsius"] {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("temperature_unit", unit))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload(&window, window.len())))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let service = WeatherService::from_config(&config(&server, &dir, false)).unwrap();
    let mut session = WeatherSession::new(service);

    session.select(UnitSystem::Imperial, today()).await.unwrap();
    session.select(UnitSystem::Imperial, today()).await.unwrap();
    let metric = session.select(UnitSystem::Metric, today()).await.unwrap();
    assert_eq!(metric.profile.system(), UnitSystem::Metric);

    let store = session.service().store();
    for system in UnitSystem::ALL {
        let (daily, hourly) = CacheKey::pair(today(), system);
        assert!(store.exists(&daily) && store.exists(&hourly));
    }
}
