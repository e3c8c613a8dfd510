//! Timestamp newtypes for the service's wire formats
//!
//! The service mixes four date representations:
//! - token expiries: UTC with millisecond fraction and a literal `Z`
//! - receipt timestamps: wall clock in the service's fixed UTC+3 zone,
//!   no offset designator
//! - list filters: bare dates
//! - challenge expiry: RFC 3339 with a numeric offset
//!
//! Each gets a dedicated newtype so a value cannot be serialized in the
//! wrong format by accident.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

const DATE_TIME_TZ_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const DATE_TIME_TZ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const MSK_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The service's wall-clock zone. UTC+3, no DST transitions since 2014.
#[must_use]
pub fn service_offset() -> FixedOffset {
    FixedOffset::east_opt(3 * 3600).expect("static UTC+3 offset")
}

/// UTC timestamp with millisecond fraction (`2024-05-01T12:30:45.123Z`).
///
/// Used for access/refresh token expiries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeTz(pub DateTime<Utc>);

impl fmt::Display for DateTimeTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_TIME_TZ_FORMAT))
    }
}

impl Serialize for DateTimeTz {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format(DATE_TIME_TZ_FORMAT))
    }
}

impl<'de> Deserialize<'de> for DateTimeTz {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TzVisitor;

        impl Visitor<'_> for TzVisitor {
            type Value = DateTimeTz;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a UTC timestamp like 2024-05-01T12:30:45.123Z")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_TZ_PARSE)
                    .map_err(de::Error::custom)?;
                Ok(DateTimeTz(naive.and_utc()))
            }
        }

        deserializer.deserialize_str(TzVisitor)
    }
}

/// Wall-clock timestamp in the service's UTC+3 zone, no offset designator
/// (`2024-05-01T15:30:45`).
///
/// Used for receipt creation/receive dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MskDateTime(pub NaiveDateTime);

impl MskDateTime {
    /// Convert to an absolute UTC instant via the fixed UTC+3 offset
    #[must_use]
    pub fn to_utc(self) -> DateTime<Utc> {
        match self.0.and_local_timezone(service_offset()) {
            chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                dt.with_timezone(&Utc)
            }
            // Unreachable for a fixed offset, but keep a sane fallback
            chrono::LocalResult::None => self.0.and_utc(),
        }
    }
}

impl fmt::Display for MskDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(MSK_DATE_TIME_FORMAT))
    }
}

impl<'de> Deserialize<'de> for MskDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MskVisitor;

        impl Visitor<'_> for MskVisitor {
            type Value = MskDateTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a wall-clock timestamp like 2024-05-01T15:30:45")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                NaiveDateTime::parse_from_str(value, MSK_DATE_TIME_FORMAT)
                    .map(MskDateTime)
                    .map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(MskVisitor)
    }
}

/// Bare date (`2024-05-01`), used for receipt list filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date(pub NaiveDate);

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.format(DATE_FORMAT))
    }
}

/// RFC 3339 timestamp with a numeric offset (`2024-05-01T12:30:45.123456+03:00`).
///
/// Used for the challenge token expiry in the SMS start response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OffsetDateTime(pub DateTime<FixedOffset>);

impl<'de> Deserialize<'de> for OffsetDateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OffsetVisitor;

        impl Visitor<'_> for OffsetVisitor {
            type Value = OffsetDateTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an RFC 3339 timestamp with offset")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                DateTime::parse_from_rfc3339(value)
                    .map(OffsetDateTime)
                    .map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(OffsetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_tz_roundtrip() {
        let parsed: DateTimeTz = serde_json::from_str("\"2024-05-01T12:30:45.123Z\"").unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            "\"2024-05-01T12:30:45.123Z\""
        );
    }

    #[test]
    fn date_time_tz_parses_without_fraction() {
        let parsed: DateTimeTz = serde_json::from_str("\"2024-05-01T12:30:45Z\"").unwrap();
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            "\"2024-05-01T12:30:45.000Z\""
        );
    }

    #[test]
    fn msk_date_time_parses_and_converts() {
        let parsed: MskDateTime = serde_json::from_str("\"2024-05-01T15:30:45\"").unwrap();
        assert_eq!(parsed.to_string(), "2024-05-01T15:30:45");
        // 15:30 at UTC+3 is 12:30 UTC
        assert_eq!(parsed.to_utc().to_rfc3339(), "2024-05-01T12:30:45+00:00");
    }

    #[test]
    fn date_serializes_bare() {
        let date = Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-05-01\"");
    }

    #[test]
    fn offset_date_time_parses_micros_and_offset() {
        let parsed: OffsetDateTime =
            serde_json::from_str("\"2024-05-01T12:30:45.123456+03:00\"").unwrap();
        assert_eq!(parsed.0.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(serde_json::from_str::<DateTimeTz>("\"2024-05-01\"").is_err());
        assert!(serde_json::from_str::<MskDateTime>("\"not a date\"").is_err());
    }
}
