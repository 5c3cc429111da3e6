//! Timestamp formatting utilities
//!
//! Standardized, configurable timestamp formats for log output. Supports
//! ISO 8601, RFC 3339, Unix timestamps, and custom strftime formats.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use annolog::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2000, 2, 1, 12, 0, 0).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&t), "2000-02-01T12:00:00.000Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
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

    /// Custom strftime format, e.g. `"%d/%b/%Y:%H:%M:%S %z"`
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format
    pub fn format(&self, timestamp: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => {
                timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
            }
            TimestampFormat::Iso8601Micros => {
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
            }
            TimestampFormat::Rfc3339 => {
                timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
            }
            TimestampFormat::Unix => timestamp.timestamp().to_string(),
            TimestampFormat::UnixMillis => timestamp.timestamp_millis().to_string(),
            TimestampFormat::Custom(fmt) => timestamp.format(fmt).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_iso8601() {
        assert_eq!(
            TimestampFormat::Iso8601.format(&sample()),
            "2000-02-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_unix() {
        assert_eq!(TimestampFormat::Unix.format(&sample()), "949406400");
        assert_eq!(
            TimestampFormat::UnixMillis.format(&sample()),
            "949406400000"
        );
    }

    #[test]
    fn test_custom() {
        let format = TimestampFormat::Custom("%Y-%m-%d".to_string());
        assert_eq!(format.format(&sample()), "2000-02-01");
    }
}
