//! Synthetic daily weather used when the provider cannot be used
//!
//! Every field is sampled independently and uniformly inside a fixed range
//! for the active unit system. Fields are not correlated with each other, so
//! a row may have `temperature_max < temperature_mean`.

use std::ops::RangeInclusive;

use rand::RngExt;

use crate::models::{DailyRecord, FetchWindow, round2};
use crate::units::{UnitProfile, UnitSystem};

/// Inclusive sampling range for every daily field
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRanges {
    pub temperature_max: RangeInclusive<f64>,
    pub temperature_min: RangeInclusive<f64>,
    pub temperature_mean: RangeInclusive<f64>,
    pub wind_speed_mean: RangeInclusive<f64>,
    pub wind_speed_min: RangeInclusive<f64>,
    pub wind_speed_max: RangeInclusive<f64>,
    pub humidity_mean: RangeInclusive<f64>,
    pub humidity_max: RangeInclusive<f64>,
    pub humidity_min: RangeInclusive<f64>,
    pub precipitation_sum: RangeInclusive<f64>,
    pub rain_sum: RangeInclusive<f64>,
}

impl SyntheticRanges {
    #[must_use]
    pub fn for_profile(profile: &UnitProfile) -> Self {
        match profile.system() {
            UnitSystem::Imperial => Self {
                temperature_max: 60.0..=90.0,
                temperature_min: 40.0..=70.0,
                temperature_mean: 50.0..=80.0,
                wind_speed_mean: 5.0..=20.0,
                wind_speed_min: 0.0..=5.0,
                wind_speed_max: 5.0..=30.0,
                humidity_mean: 60.0..=90.0,
                humidity_max: 70.0..=100.0,
                humidity_min: 40.0..=70.0,
                precipitation_sum: 0.0..=1.0,
                rain_sum: 0.0..=0.8,
            },
            UnitSystem::Metric => Self {
                temperature_max: 15.0..=32.0,
                temperature_min: 4.0..=21.0,
                temperature_mean: 10.0..=27.0,
                wind_speed_mean: 8.0..=32.0,
                wind_speed_min: 0.0..=8.0,
                wind_speed_max: 8.0..=48.0,
                humidity_mean: 60.0..=90.0,
                humidity_max: 70.0..=100.0,
                humidity_min: 40.0..=70.0,
                precipitation_sum: 0.0..=25.0,
                rain_sum: 0.0..=20.0,
            },
        }
    }

    /// Whether every field of `record` lies within its range
    #[must_use]
    pub fn admits(&self, record: &DailyRecord) -> bool {
        let within = |range: &RangeInclusive<f64>, value: Option<f64>| {
            value.is_some_and(|v| range.contains(&v))
        };
        within(&self.temperature_max, record.temperature_max)
            && within(&self.temperature_min, record.temperature_min)
            && within(&self.temperature_mean, record.temperature_mean)
            && within(&self.wind_speed_mean, record.wind_speed_mean)
            && within(&self.wind_speed_min, record.wind_speed_min)
            && within(&self.wind_speed_max, record.wind_speed_max)
            && within(&self.humidity_mean, record.humidity_mean)
            && within(&self.humidity_max, record.humidity_max)
            && within(&self.humidity_min, record.humidity_min)
            && within(&self.precipitation_sum, record.precipitation_sum)
            && within(&self.rain_sum, record.rain_sum)
    }
}

fn sample<R: RngExt + ?Sized>(rng: &mut R, range: &RangeInclusive<f64>) -> Option<f64> {
    // Rounding keeps the value inside an inclusive range with 2-decimal bounds
    Some(round2(rng.random_range(range.clone())))
}

/// One synthetic record per day of `window`, in ascending date order.
pub fn synthesize<R: RngExt + ?Sized>(
    profile: &UnitProfile,
    window: &FetchWindow,
    rng: &mut R,
) -> Vec<DailyRecord> {
    let ranges = SyntheticRanges::for_profile(profile);
    window
        .dates()
        .map(|date| DailyRecord {
            date,
            temperature_max: sample(rng, &ranges.temperature_max),
            temperature_min: sample(rng, &ranges.temperature_min),
            temperature_mean: sample(rng, &ranges.temperature_mean),
            wind_speed_mean: sample(rng, &ranges.wind_speed_mean),
            wind_speed_min: sample(rng, &ranges.wind_speed_min),
            wind_speed_max: sample(rng, &ranges.wind_speed_max),
            humidity_mean: sample(rng, &ranges.humidity_mean),
            humidity_max: sample(rng, &ranges.humidity_max),
            humidity_min: sample(rng, &ranges.humidity_min),
            precipitation_sum: sample(rng, &ranges.precipitation_sum),
            rain_sum: sample(rng, &ranges.rain_sum),
        })
        .collect()
}
