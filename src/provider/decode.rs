//! Open-Meteo response structures and column-to-row conversion
//!
//! The provider answers with one block per granularity: a `time` axis of
//! Unix timestamps plus one value array per requested variable. Rows are
//! only emitted when the axis covers the requested window exactly.

use std::collections::HashMap;

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;

use crate::models::{
    DAILY_VARIABLES, DailyRecord, FetchWindow, Granularity, HOURLY_VARIABLES, HourlyRecord,
    round2,
};
use crate::{Result, WeatherError};

/// Forecast response from `OpenMeteo` (requested with `timeformat=unixtime`)
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    /// Fixed offset the provider used to align days
    pub utc_offset_seconds: i32,
    pub daily: ColumnBlock,
    pub hourly: ColumnBlock,
}

/// Column-major time series
#[derive(Debug, Deserialize)]
pub struct ColumnBlock {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub columns: HashMap<String, Vec<Option<f64>>>,
}

/// Both record sets of one successful fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFrames {
    pub daily: Vec<DailyRecord>,
    pub hourly: Vec<HourlyRecord>,
}

/// Expected time axis `[start, end)` stepping by `interval` seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub start: i64,
    pub end: i64,
    pub interval: i64,
}

impl TimeAxis {
    #[must_use]
    pub fn for_window(window: &FetchWindow, offset: FixedOffset, granularity: Granularity) -> Self {
        Self {
            start: local_midnight(window.start(), offset),
            end: local_midnight(window.end(), offset),
            interval: granularity.interval_seconds(),
        }
    }

    /// `(end - start) / interval`
    #[must_use]
    pub fn rows(&self) -> usize {
        usize::try_from((self.end - self.start) / self.interval).unwrap_or(0)
    }

    fn at(&self, row: usize) -> i64 {
        self.start + self.interval * row as i64
    }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() - i64::from(offset.local_minus_utc())
}

/// Decode both blocks of a response against the requested window.
///
/// # Errors
///
/// [`WeatherError::DecodeMismatch`] if either block does not match the
/// window; no partial result is returned.
pub fn decode(response: &ForecastResponse, window: &FetchWindow) -> Result<ProviderFrames> {
    let offset = FixedOffset::east_opt(response.utc_offset_seconds).ok_or_else(|| {
        WeatherError::decode_mismatch(
            Granularity::Daily,
            format!("invalid utc offset {}s", response.utc_offset_seconds),
        )
    })?;

    let daily = decode_daily(&response.daily, window, offset)?;
    let hourly = decode_hourly(&response.hourly, window, offset)?;
    Ok(ProviderFrames { daily, hourly })
}

/// Decode the daily block; all values rounded to 2 decimals.
///
/// # Errors
///
/// [`WeatherError::DecodeMismatch`] on any axis or column length mismatch.
pub fn decode_daily(
    block: &ColumnBlock,
    window: &FetchWindow,
    offset: FixedOffset,
) -> Result<Vec<DailyRecord>> {
    let axis = TimeAxis::for_window(window, offset, Granularity::Daily);
    check_axis(Granularity::Daily, &axis, &block.time)?;
    let rows = axis.rows();

    let mut columns = Vec::with_capacity(DAILY_VARIABLES.len());
    for name in DAILY_VARIABLES {
        columns.push(column(block, name, rows, Granularity::Daily)?);
    }
    let value = |col: usize, row: usize| columns[col][row].map(round2);

    Ok(window
        .dates()
        .enumerate()
        .map(|(row, date)| DailyRecord {
            date,
            temperature_max: value(0, row),
            temperature_min: value(1, row),
            temperature_mean: value(2, row),
            wind_speed_mean: value(3, row),
            wind_speed_min: value(4, row),
            wind_speed_max: value(5, row),
            humidity_mean: value(6, row),
            humidity_max: value(7, row),
            humidity_min: value(8, row),
            precipitation_sum: value(9, row),
            rain_sum: value(10, row),
        })
        .collect())
}

/// Decode the hourly block; temperatures keep provider precision.
///
/// # Errors
///
/// [`WeatherError::DecodeMismatch`] on any axis or column length mismatch.
pub fn decode_hourly(
    block: &ColumnBlock,
    window: &FetchWindow,
    offset: FixedOffset,
) -> Result<Vec<HourlyRecord>> {
    let axis = TimeAxis::for_window(window, offset, Granularity::Hourly);
    check_axis(Granularity::Hourly, &axis, &block.time)?;
    let temperature = column(block, HOURLY_VARIABLES[0], axis.rows(), Granularity::Hourly)?;

    block
        .time
        .iter()
        .zip(temperature)
        .map(|(&ts, &temperature)| {
            let timestamp = offset.timestamp_opt(ts, 0).single().ok_or_else(|| {
                WeatherError::decode_mismatch(
                    Granularity::Hourly,
                    format!("timestamp {ts} out of range"),
                )
            })?;
            Ok(HourlyRecord {
                timestamp,
                temperature,
            })
        })
        .collect()
}

fn check_axis(granularity: Granularity, axis: &TimeAxis, time: &[i64]) -> Result<()> {
    let expected = axis.rows();
    if time.len() != expected {
        return Err(WeatherError::decode_mismatch(
            granularity,
            format!("{} time steps, expected {}", time.len(), expected),
        ));
    }
    if let Some((row, &ts)) = time.iter().enumerate().find(|(row, ts)| **ts != axis.at(*row)) {
        return Err(WeatherError::decode_mismatch(
            granularity,
            format!("time step {row} is {ts}, expected {}", axis.at(row)),
        ));
    }
    Ok(())
}

fn column<'a>(
    block: &'a ColumnBlock,
    name: &str,
    rows: usize,
    granularity: Granularity,
) -> Result<&'a [Option<f64>]> {
    let values = block.columns.get(name).ok_or_else(|| {
        WeatherError::decode_mismatch(granularity, format!("missing variable '{name}'"))
    })?;
    if values.len() != rows {
        return Err(WeatherError::decode_mismatch(
            granularity,
            format!("'{name}' has {} values, expected {}", values.len(), rows),
        ));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const EDT: i32 = -4 * 3600;

    fn window() -> FetchWindow {
        FetchWindow::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), 2, 1)
    }

    fn block(time: Vec<i64>, columns: &[(&str, Value)]) -> ColumnBlock {
        let mut object = serde_json::Map::new();
        object.insert("time".into(), json!(time));
        for (name, values) in columns {
            object.insert((*name).into(), values.clone());
        }
        serde_json::from_value(Value::Object(object)).unwrap()
    }

    fn daily_block(rows: usize) -> ColumnBlock {
        let offset = FixedOffset::east_opt(EDT).unwrap();
        let axis = TimeAxis::for_window(&window(), offset, Granularity::Daily);
        let time = (0..rows).map(|r| axis.at(r)).collect();
        let columns: Vec<(&str, Value)> = DAILY_VARIABLES
            .iter()
            .map(|name| (*name, json!(vec![61.237_f64; rows])))
            .collect();
        block(time, &columns)
    }

    fn hourly_block(rows: usize) -> ColumnBlock {
        let offset = FixedOffset::east_opt(EDT).unwrap();
        let axis = TimeAxis::for_window(&window(), offset, Granularity::Hourly);
        let time = (0..rows).map(|r| axis.at(r)).collect();
        let temps: Vec<f64> = (0..rows).map(|r| 50.0 + r as f64 * 0.123_4).collect();
        block(time, &[("temperature_2m", json!(temps))])
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(EDT).unwrap()
    }

    #[test]
    fn test_axis_rows_follow_window() {
        let daily = TimeAxis::for_window(&window(), offset(), Granularity::Daily);
        assert_eq!(daily.rows(), 3);
        let hourly = TimeAxis::for_window(&window(), offset(), Granularity::Hourly);
        assert_eq!(hourly.rows(), 72);
        // 2026-10-17 00:00 at UTC-4
        assert_eq!(daily.start, 1_792_209_600);
    }

    #[test]
    fn test_decode_daily_rounds_and_dates_rows() {
        let records = decode_daily(&daily_block(3), &window(), offset()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].date, window().start());
        assert_eq!(records[2].date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(records.iter().all(|r| r.temperature_max == Some(61.24)));
        assert!(records.iter().all(|r| r.rain_sum == Some(61.24)));
    }

    #[test]
    fn test_decode_daily_keeps_nulls() {
        let mut block = daily_block(3);
        block
            .columns
            .insert("temperature_2m_mean".into(), vec![Some(60.0), None, Some(58.556)]);
        let records = decode_daily(&block, &window(), offset()).unwrap();
        assert_eq!(records[1].temperature_mean, None);
        assert_eq!(records[2].temperature_mean, Some(58.56));
    }

    #[test]
    fn test_decode_daily_row_count_mismatch() {
        let err = decode_daily(&daily_block(2), &window(), offset()).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::DecodeMismatch { granularity: Granularity::Daily, .. }
        ));
    }

    #[test]
    fn test_decode_daily_short_column() {
        let mut block = daily_block(3);
        block.columns.insert("rain_sum".into(), vec![Some(0.1), Some(0.2)]);
        let err = decode_daily(&block, &window(), offset()).unwrap_err();
        assert!(err.to_string().contains("rain_sum"));
    }

    #[test]
    fn test_decode_daily_missing_column() {
        let mut block = daily_block(3);
        block.columns.remove("wind_speed_10m_min");
        let err = decode_daily(&block, &window(), offset()).unwrap_err();
        assert!(err.to_string().contains("missing variable 'wind_speed_10m_min'"));
    }

    #[test]
    fn test_decode_hourly_keeps_precision() {
        let records = decode_hourly(&hourly_block(72), &window(), offset()).unwrap();
        assert_eq!(records.len(), 72);
        assert_eq!(records[1].temperature, Some(50.123_4));
        assert_eq!(records[0].timestamp.to_rfc3339(), "2026-10-17T00:00:00-04:00");
        assert!(records.windows(2).all(|w| {
            (w[1].timestamp - w[0].timestamp).num_seconds() == 3600
        }));
    }

    #[test]
    fn test_decode_hourly_gap_is_mismatch() {
        let mut block = hourly_block(72);
        block.time[10] += 3600;
        let err = decode_hourly(&block, &window(), offset()).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::DecodeMismatch { granularity: Granularity::Hourly, .. }
        ));
    }

    #[test]
    fn test_decode_rejects_shifted_window() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let err = decode_daily(&daily_block(3), &window(), utc).unwrap_err();
        assert!(err.to_string().contains("time step 0"));
    }

    #[test]
    fn test_decode_whole_response() {
        let response = ForecastResponse {
            utc_offset_seconds: EDT,
            daily: daily_block(3),
            hourly: hourly_block(71),
        };
        let err = decode(&response, &window()).unwrap_err();
        assert!(matches!(
            err,
            WeatherError::DecodeMismatch { granularity: Granularity::Hourly, .. }
        ));
    }
}
