//! Data models for the Weathervane library
//!
//! - Location: the fixed observation point
//! - Window: the contiguous date range requested from the provider
//! - Records: daily and hourly rows, plus their granularity

pub mod location;
pub mod records;
pub mod window;

pub use location::Location;
pub use records::{
    DAILY_VARIABLES, DailyRecord, Granularity, HOURLY_VARIABLES, HourlyRecord, Record, round2,
};
pub use window::FetchWindow;
