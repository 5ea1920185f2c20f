//! Calendar-day truncation for post timestamps
//!
//! Timestamps are reduced to the calendar date they carry. Time of day and any
//! UTC offset are discarded without conversion, so all inputs are expected to
//! share one time zone upstream.

use crate::config::DateConfig;
use crate::error::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Parses date cells using RFC 3339 first, then the configured layouts
#[derive(Debug, Clone)]
pub struct DayParser {
    datetime_formats: Vec<String>,
    date_formats: Vec<String>,
}

impl Default for DayParser {
    fn default() -> Self {
        Self::new(&DateConfig::default())
    }
}

impl DayParser {
    pub fn new(config: &DateConfig) -> Self {
        Self {
            datetime_formats: config.datetime_formats.clone(),
            date_formats: config.date_formats.clone(),
        }
    }

    /// Calendar date of a textual timestamp, `None` if it cannot be read
    pub fn parse_day(&self, raw: &str) -> Option<NaiveDate> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(ts.naive_local().date());
        }

        for format in &self.datetime_formats {
            if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
                return Some(ts.date());
            }
        }

        for format in &self.date_formats {
            if let Ok(day) = NaiveDate::parse_from_str(text, format) {
                return Some(day);
            }
        }

        // Anything else that starts with an ISO date, e.g. "2024-03-01 10:00:00 +05:30"
        text.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }

    /// Calendar date of every cell in a column of any type
    ///
    /// Date and datetime columns are rendered to text first, so the same
    /// parsing rules apply to every source format.
    pub fn day_column(&self, column: &Series) -> Result<Vec<Option<NaiveDate>>> {
        let text = column.cast(&DataType::String)?;
        let days = text
            .str()?
            .into_iter()
            .map(|cell| cell.and_then(|raw| self.parse_day(raw)))
            .collect();
        Ok(days)
    }
}

/// Day number used as a grouping key inside dataframes
pub fn day_key(day: NaiveDate) -> i32 {
    day.num_days_from_ce()
}

/// Inverse of [`day_key`]
pub fn day_from_key(key: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(key)
}
