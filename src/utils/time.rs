use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_english::parse_date_string;
use clap::ValueEnum;

/// This is the standard way of converting a date to a string in dasho. Stored keys and
/// records both use it.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Accepts `YYYY-MM-DD` directly and otherwise falls back to natural phrases such as
/// "yesterday" or "15/03/2025", resolved relative to `now`.
pub fn parse_day(value: &str, now: DateTime<Utc>, style: DateStyle) -> Result<NaiveDate> {
    if let Some(date) = parse_date_key(value.trim()) {
        return Ok(date);
    }
    parse_date_string(value, now, style.into())
        .map(|v| v.date_naive())
        .map_err(|e| anyhow!("Can't parse {value:?} into a date: {e}"))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{date_key, parse_date_key, parse_day, DateStyle};

    #[test]
    fn test_date_key_format() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(date_key(date), "2025-03-07");
        assert_eq!(parse_date_key("2025-03-07"), Some(date));
        assert_eq!(parse_date_key("07/03/2025"), None);
    }

    #[test]
    fn test_parse_day_relative() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(
            parse_day("2025-01-02", now, DateStyle::Uk).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert_eq!(
            parse_day("yesterday", now, DateStyle::Uk).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 6).unwrap()
        );
        assert!(parse_day("not a date at all", now, DateStyle::Uk).is_err());
    }
}
