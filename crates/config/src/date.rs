//! Calendar dates of the launch window.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::ConfigError;

/// Unix time of J2000 (2000-01-01 12:00 UTC, leap seconds ignored).
const J2000_UNIX: i64 = 946_728_000;

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_start_date(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|source| ConfigError::Date {
            value: value.to_string(),
            source,
        })
}

pub fn seconds_since_j2000(date: &DateTime<Utc>) -> f64 {
    (date.timestamp() - J2000_UNIX) as f64 + f64::from(date.timestamp_subsec_millis()) / 1_000.0
}
