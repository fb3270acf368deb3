//! Lenient timestamp parsing for values coming off the wire.
//!
//! The service is not consistent about how it renders date-times: some
//! endpoints emit RFC 3339 with an offset, some add nanosecond precision, and
//! some emit a bare `YYYY-MM-DDTHH:MM:SS.ffffff` with no zone at all. A
//! quoted or unquoted literal `null` means "no value".

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::TimeFormatError;

/// Accepted textual layouts, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `2024-01-01T00:00:00Z`, `2024-01-01T08:00:00+08:00`.
    Rfc3339,
    /// `2024-01-01T00:00:00.123456789+00:00`.
    Rfc3339Fractional,
    /// `2024-01-01T00:00:00.123456`, no offset.
    NaiveFractional,
}

const LAYOUTS: [Layout; 3] = [
    Layout::Rfc3339,
    Layout::Rfc3339Fractional,
    Layout::NaiveFractional,
];

impl Layout {
    fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            Self::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Rfc3339Fractional => DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            // No zone on the wire; treated as UTC.
            Self::NaiveFractional => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc()),
        }
    }
}

/// Parse a timestamp in any of the accepted layouts.
///
/// Surrounding double quotes are stripped first. The literal `null` yields
/// `Ok(None)`; any other string that matches none of the layouts is a
/// [`TimeFormatError`].
///
/// ```
/// use powermemo_core::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("\"2024-01-01T00:00:00Z\"").unwrap();
/// assert!(ts.is_some());
/// assert_eq!(parse_timestamp("null").unwrap(), None);
/// assert!(parse_timestamp("not-a-date").is_err());
/// ```
pub fn parse_timestamp(text: &str) -> Result<Option<DateTime<Utc>>, TimeFormatError> {
    let s = text.trim_matches('"');
    if s == "null" {
        return Ok(None);
    }

    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(s))
        .map(Some)
        .ok_or_else(|| TimeFormatError::new(s))
}

/// Render a timestamp the way the service accepts it on input.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Serde adapter for `Option<DateTime<Utc>>` fields.
///
/// Absent, JSON `null` and the string `"null"` all decode to `None`.
pub mod option {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc, format_timestamp, parse_timestamp};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(text) => parse_timestamp(&text).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Serde adapter for required `DateTime<Utc>` fields.
///
/// A `null` value is rejected here since the field has no empty state.
pub mod required {
    use super::{DateTime, Deserialize, Deserializer, Serializer, Utc, format_timestamp, parse_timestamp};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        parse_timestamp(&text)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("timestamp is null"))
    }
}
