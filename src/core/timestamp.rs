//! Date formatting for server-side messages
//!
//! The `dateFormat` root option selects how `%date`-style placeholders render
//! client and server timestamps.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standardized timestamp format options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format, validated when parsed
    Custom(String),
}

impl DateFormat {
    /// Parse a `dateFormat` attribute value
    ///
    /// Well-known names are matched case-insensitively; anything else must be
    /// a valid strftime pattern. Returns `None` for a pattern chrono rejects.
    ///
    /// ```
    /// use rust_log_intake::DateFormat;
    ///
    /// assert_eq!(DateFormat::parse("iso8601"), Some(DateFormat::Iso8601));
    /// assert_eq!(DateFormat::parse("%Y-%m-%d"), Some(DateFormat::Custom("%Y-%m-%d".into())));
    /// assert_eq!(DateFormat::parse("%Q"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "iso8601" | "o" => return Some(DateFormat::Iso8601),
            "iso8601micros" => return Some(DateFormat::Iso8601Micros),
            "rfc3339" => return Some(DateFormat::Rfc3339),
            "unix" => return Some(DateFormat::Unix),
            "unixmillis" => return Some(DateFormat::UnixMillis),
            _ => {}
        }

        if value.is_empty() || StrftimeItems::new(value).any(|item| matches!(item, Item::Error)) {
            None
        } else {
            Some(DateFormat::Custom(value.to_string()))
        }
    }

    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            DateFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            DateFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            DateFormat::Rfc3339 => datetime.to_rfc3339(),
            DateFormat::Unix => datetime.timestamp().to_string(),
            DateFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            DateFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_iso8601_format() {
        assert_eq!(DateFormat::Iso8601.format(&fixed_datetime()), "2025-01-08T10:30:45.123Z");
        assert_eq!(
            DateFormat::Iso8601Micros.format(&fixed_datetime()),
            "2025-01-08T10:30:45.123456Z"
        );
    }

    #[test]
    fn test_unix_formats() {
        let secs: i64 = DateFormat::Unix.format(&fixed_datetime()).parse().unwrap();
        let millis: i64 = DateFormat::UnixMillis.format(&fixed_datetime()).parse().unwrap();
        assert_eq!(millis / 1000, secs);
    }

    #[test]
    fn test_custom_apache_format() {
        let format = DateFormat::parse("%d/%b/%Y:%H:%M:%S +0000").unwrap();
        assert_eq!(format.format(&fixed_datetime()), "08/Jan/2025:10:30:45 +0000");
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        assert_eq!(DateFormat::parse(""), None);
        assert_eq!(DateFormat::parse("%Y-%"), None);
        assert_eq!(DateFormat::parse("RFC3339"), Some(DateFormat::Rfc3339));
    }

    #[test]
    fn test_default_is_iso8601() {
        assert_eq!(DateFormat::default(), DateFormat::Iso8601);
    }
}
