//! Read-side helpers over a [`WeatherSnapshot`]

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DailyRecord, HourlyRecord};
use crate::service::WeatherSnapshot;

/// Headline values for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub humidity_mean: Option<f64>,
}

/// Daily field that can be summarised across the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyField {
    TemperatureMax,
    TemperatureMin,
    TemperatureMean,
    WindSpeedMean,
    WindSpeedMax,
    HumidityMean,
    PrecipitationSum,
}

impl DailyField {
    pub const TEMPERATURES: [DailyField; 3] = [
        DailyField::TemperatureMax,
        DailyField::TemperatureMin,
        DailyField::TemperatureMean,
    ];

    #[must_use]
    pub fn value(self, record: &DailyRecord) -> Option<f64> {
        match self {
            DailyField::TemperatureMax => record.temperature_max,
            DailyField::TemperatureMin => record.temperature_min,
            DailyField::TemperatureMean => record.temperature_mean,
            DailyField::WindSpeedMean => record.wind_speed_mean,
            DailyField::WindSpeedMax => record.wind_speed_max,
            DailyField::HumidityMean => record.humidity_mean,
            DailyField::PrecipitationSum => record.precipitation_sum,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DailyField::TemperatureMax => "Max Temperature",
            DailyField::TemperatureMin => "Min Temperature",
            DailyField::TemperatureMean => "Mean Temperature",
            DailyField::WindSpeedMean => "Mean Wind Speed",
            DailyField::WindSpeedMax => "Max Wind Speed",
            DailyField::HumidityMean => "Mean Humidity",
            DailyField::PrecipitationSum => "Precipitation",
        }
    }
}

/// Five-number summary for box plots
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Distribution {
    /// Quartiles use linear interpolation between closest ranks.
    /// `None` for an empty input; NaN values are ignored.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

impl WeatherSnapshot {
    /// Summary for `date`, if the daily data covers it
    #[must_use]
    pub fn day_summary(&self, date: NaiveDate) -> Option<DaySummary> {
        self.daily.iter().find(|r| r.date == date).map(|r| DaySummary {
            date,
            temperature_max: r.temperature_max,
            wind_speed_max: r.wind_speed_max,
            humidity_mean: r.humidity_mean,
        })
    }

    /// Hourly samples whose local date is `date`
    #[must_use]
    pub fn hourly_for(&self, date: NaiveDate) -> Vec<&HourlyRecord> {
        self.hourly
            .iter()
            .filter(|r| r.timestamp.date_naive() == date)
            .collect()
    }

    /// Distinct days with hourly data from `today` on, ascending
    #[must_use]
    pub fn upcoming_days(&self, today: NaiveDate) -> Vec<NaiveDate> {
        self.hourly
            .iter()
            .map(|r| r.timestamp.date_naive())
            .filter(|d| *d >= today)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distribution of `field` across every daily record
    #[must_use]
    pub fn distribution(&self, field: DailyField) -> Option<Distribution> {
        Distribution::of(self.daily.iter().filter_map(|r| field.value(r)))
    }
}
