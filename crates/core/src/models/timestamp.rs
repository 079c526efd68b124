//! Timestamp tolerance for the gateway boundary.
//!
//! The server sends ISO-8601 timestamps both with and without fractional
//! seconds (`2025-06-13T10:15:00.123Z` and `2025-06-13T10:15:00Z`), with a
//! `Z` suffix or an explicit offset. Both are accepted and normalized to UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.f";
const WHOLE_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a server timestamp. Returns `None` if no accepted format matches.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less variants are interpreted as UTC.
    let trimmed = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, FRACTIONAL)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, WHOLE_SECONDS))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a timestamp the way the server expects it (RFC 3339, millisecond precision).
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("cannot decode date string: {raw}")))
}

/// Same as the parent module, for optional fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => super::parse(&s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("cannot decode date string: {s}"))
            }),
        }
    }
}
