//! Cache key and its file name encoding
//!
//! The file name is the only place a key is recorded, so encoding and
//! parsing live together here and nowhere else:
//!
//! `<unit_system>_<granularity>_data_<YYYY-MM-DD>.csv`

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Granularity;
use crate::units::UnitSystem;

const DATA_MARKER: &str = "data";
const EXTENSION: &str = "csv";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifies one cache entry.
///
/// `fetch_date` is the day the entry was produced, not a day of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fetch_date: NaiveDate,
    pub unit_system: UnitSystem,
    pub granularity: Granularity,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("'{0}' is not a .csv cache file")]
    Extension(String),
    #[error("'{0}' does not follow <units>_<granularity>_data_<date>")]
    Layout(String),
    #[error("unknown unit system in '{0}'")]
    UnitSystem(String),
    #[error("unknown granularity in '{0}'")]
    Granularity(String),
    #[error("invalid fetch date in '{0}'")]
    Date(String),
}

impl CacheKey {
    #[must_use]
    pub fn new(fetch_date: NaiveDate, unit_system: UnitSystem, granularity: Granularity) -> Self {
        Self {
            fetch_date,
            unit_system,
            granularity,
        }
    }

    /// Keys for the daily and hourly entries of one fetch
    #[must_use]
    pub fn pair(fetch_date: NaiveDate, unit_system: UnitSystem) -> (Self, Self) {
        (
            Self::new(fetch_date, unit_system, Granularity::Daily),
            Self::new(fetch_date, unit_system, Granularity::Hourly),
        )
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            self.unit_system,
            self.granularity,
            DATA_MARKER,
            self.fetch_date.format(DATE_FORMAT),
            EXTENSION
        )
    }

    /// Recover a key from a file name produced by [`CacheKey::file_name`].
    ///
    /// # Errors
    ///
    /// Returns a [`KeyParseError`] naming the first part that does not match.
    pub fn parse_file_name(name: &str) -> Result<Self, KeyParseError> {
        let stem = name
            .strip_suffix(EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| KeyParseError::Extension(name.to_string()))?;

        let mut parts = stem.splitn(4, '_');
        let (Some(system), Some(granularity), Some(marker), Some(date)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(KeyParseError::Layout(name.to_string()));
        };
        if marker != DATA_MARKER {
            return Err(KeyParseError::Layout(name.to_string()));
        }

        let unit_system = system
            .parse::<UnitSystem>()
            .map_err(|_| KeyParseError::UnitSystem(name.to_string()))?;
        let granularity = granularity
            .parse::<Granularity>()
            .map_err(|_| KeyParseError::Granularity(name.to_string()))?;
        let fetch_date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| KeyParseError::Date(name.to_string()))?;

        Ok(Self::new(fetch_date, unit_system, granularity))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
