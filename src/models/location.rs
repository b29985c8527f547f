//! Location model for the observed point

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{Result, WeatherError};

/// Fixed point the weather is fetched for
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Display name (city, region, etc.)
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone name the provider aggregates days in
    pub timezone: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(name: String, latitude: f64, longitude: f64, timezone: String) -> Self {
        Self {
            name,
            latitude,
            longitude,
            timezone,
        }
    }

    /// Louisville, KY
    #[must_use]
    pub fn louisville() -> Self {
        Self::new(
            "Louisville, KY".to_string(),
            38.2542,
            -85.7594,
            "America/New_York".to_string(),
        )
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Parsed IANA timezone
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Config`] for an unknown timezone name.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| WeatherError::config(format!("Unknown timezone '{}'", self.timezone)))
    }

    /// Calendar day at `now` in the location's timezone
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Config`] for an unknown timezone name.
    pub fn local_date(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(now.with_timezone(&self.tz()?).date_naive())
    }

    /// Today in the location's timezone
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Config`] for an unknown timezone name.
    pub fn today(&self) -> Result<NaiveDate> {
        self.local_date(Utc::now())
    }
}
