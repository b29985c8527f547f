//! Contiguous date window requested from the provider

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days of history requested on every fetch
pub const DEFAULT_PAST_DAYS: u32 = 31;
/// Days of forecast (including the anchor day) requested on every fetch
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Window of calendar days `[start, end)` around an anchor day.
///
/// `past_days` days precede the anchor; the anchor itself is the first of
/// the `forecast_days` forecast days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub anchor: NaiveDate,
    pub past_days: u32,
    pub forecast_days: u32,
}

impl FetchWindow {
    #[must_use]
    pub fn new(anchor: NaiveDate, past_days: u32, forecast_days: u32) -> Self {
        Self {
            anchor,
            past_days,
            forecast_days,
        }
    }

    /// 31 past days plus a 7 day forecast horizon
    #[must_use]
    pub fn around(anchor: NaiveDate) -> Self {
        Self::new(anchor, DEFAULT_PAST_DAYS, DEFAULT_FORECAST_DAYS)
    }

    /// First day of the window (inclusive)
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.anchor - Days::new(u64::from(self.past_days))
    }

    /// Day after the last day of the window (exclusive)
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.anchor + Days::new(u64::from(self.forecast_days))
    }

    /// Number of calendar days in the window
    #[must_use]
    pub fn len(&self) -> usize {
        (self.past_days + self.forecast_days) as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date < self.end()
    }

    /// Every day of the window in ascending order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        self.start().iter_days().take(self.len())
    }
}
