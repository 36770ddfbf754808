//! Timestamps as the Threads API writes them
//!
//! The API emits `2024-06-15T10:30:00+0000`. Other producers use RFC3339
//! with or without fractional seconds. All of them parse; output is always
//! RFC3339 in UTC with a `Z` suffix.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];
const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A UTC instant that round-trips through the API's timestamp formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Parse any of the accepted formats
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .or_else(|| {
                // Offset-less values are taken as UTC
                NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
                    .ok()
                    .map(|naive| Self(naive.and_utc()))
            })
    }

    /// Current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Seconds since the Unix epoch
    pub const fn unix(&self) -> i64 {
        self.0.timestamp()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(OUTPUT_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unrecognised timestamp: {s}"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn expected() -> Timestamp {
        Timestamp(Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap())
    }

    #[test]
    fn test_parse_accepted_formats() {
        assert_eq!(Timestamp::parse("2024-06-15T10:30:00Z"), Some(expected()));
        assert_eq!(Timestamp::parse("2024-06-15T10:30:00+0000"), Some(expected()));
        assert_eq!(Timestamp::parse("2024-06-15T03:30:00-0700"), Some(expected()));
        assert_eq!(Timestamp::parse("2024-06-15T10:30:00.000Z"), Some(expected()));
        assert_eq!(Timestamp::parse("2024-06-15T12:30:00+02:00"), Some(expected()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("").is_none());
    }

    #[test]
    fn test_serializes_as_utc_z() {
        let json = serde_json::to_string(&expected()).unwrap();
        assert_eq!(json, "\"2024-06-15T10:30:00Z\"");

        let back: Timestamp = serde_json::from_str("\"2024-06-15T10:30:00+0000\"").unwrap();
        assert_eq!(back, expected());
    }
}
