//! Daily and hourly weather records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Record resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Hourly => "hourly",
        }
    }

    /// Spacing of the provider's time axis in seconds
    #[must_use]
    pub fn interval_seconds(self) -> i64 {
        match self {
            Granularity::Daily => 86_400,
            Granularity::Hourly => 3_600,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "daily" => Ok(Granularity::Daily),
            "hourly" => Ok(Granularity::Hourly),
            other => Err(format!("unknown granularity '{other}'")),
        }
    }
}

/// A record type that can be cached on its own
pub trait Record: Serialize + DeserializeOwned + Clone + PartialEq {
    const GRANULARITY: Granularity;
    /// Column header of the serialized form, in order
    const COLUMNS: &'static [&'static str];
}

/// One calendar day of aggregated observations or forecast.
///
/// Serialized column names are the provider's variable names. Values are
/// rounded to 2 decimals; `None` where the provider reported no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(rename = "temperature_2m_max")]
    pub temperature_max: Option<f64>,
    #[serde(rename = "temperature_2m_min")]
    pub temperature_min: Option<f64>,
    #[serde(rename = "temperature_2m_mean")]
    pub temperature_mean: Option<f64>,
    #[serde(rename = "wind_speed_10m_mean")]
    pub wind_speed_mean: Option<f64>,
    #[serde(rename = "wind_speed_10m_min")]
    pub wind_speed_min: Option<f64>,
    #[serde(rename = "wind_speed_10m_max")]
    pub wind_speed_max: Option<f64>,
    #[serde(rename = "relative_humidity_2m_mean")]
    pub humidity_mean: Option<f64>,
    #[serde(rename = "relative_humidity_2m_max")]
    pub humidity_max: Option<f64>,
    #[serde(rename = "relative_humidity_2m_min")]
    pub humidity_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub rain_sum: Option<f64>,
}

impl Record for DailyRecord {
    const GRANULARITY: Granularity = Granularity::Daily;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "temperature_2m_max",
        "temperature_2m_min",
        "temperature_2m_mean",
        "wind_speed_10m_mean",
        "wind_speed_10m_min",
        "wind_speed_10m_max",
        "relative_humidity_2m_mean",
        "relative_humidity_2m_max",
        "relative_humidity_2m_min",
        "precipitation_sum",
        "rain_sum",
    ];
}

/// Daily variables requested from the provider, in column order
pub const DAILY_VARIABLES: [&str; 11] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "wind_speed_10m_mean",
    "wind_speed_10m_min",
    "wind_speed_10m_max",
    "relative_humidity_2m_mean",
    "relative_humidity_2m_max",
    "relative_humidity_2m_min",
    "precipitation_sum",
    "rain_sum",
];

/// Hourly variables requested from the provider
pub const HOURLY_VARIABLES: [&str; 1] = ["temperature_2m"];

/// One hourly temperature sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(rename = "date")]
    pub timestamp: DateTime<FixedOffset>,
    /// Provider precision, not rounded
    #[serde(rename = "temperature_2m")]
    pub temperature: Option<f64>,
}

impl Record for HourlyRecord {
    const GRANULARITY: Granularity = Granularity::Hourly;
    const COLUMNS: &'static [&'static str] = &["date", "temperature_2m"];
}

/// Round to 2 decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
