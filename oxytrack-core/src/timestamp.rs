//! ISO-8601 timestamp handling shared by the local cache and the models.
//!
//! Dates are persisted as UTC strings with millisecond precision and a
//! trailing `Z` (`2025-01-01T08:00:00.000Z`). Reading accepts exactly that
//! shape and falls back to general RFC 3339 for documents written by other
//! tools.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// chrono format string for the persisted timestamp shape.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Duration label for a production run that has not ended yet.
pub const IN_PROGRESS: &str = "En cours";

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Current time truncated to milliseconds, so it survives a cache round-trip.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Revision used for documents that predate revision tracking.
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn to_iso(value: &DateTime<Utc>) -> String {
    value.format(ISO_FORMAT).to_string()
}

/// Returns true if `s` has the exact persisted shape
/// `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn is_iso_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 24 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        19 => *b == b'.',
        23 => *b == b'Z',
        _ => b.is_ascii_digit(),
    })
}

/// Parses a persisted timestamp. Returns `None` for anything that is not a
/// valid date in the persisted shape.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if !is_iso_timestamp(s) {
        return None;
    }
    NaiveDateTime::parse_from_str(s, ISO_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_lenient(s: &str) -> Option<DateTime<Utc>> {
    parse_iso(s).or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Formats a millisecond span as `"{H}h {M}m"`; negative spans render `N/A`.
pub fn format_duration(millis: i64) -> String {
    if millis < 0 {
        return "N/A".to_string();
    }
    let total_seconds = millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Whole hours in a millisecond span, rounded down.
pub fn whole_hours(millis: i64) -> i64 {
    millis.div_euclid(MILLIS_PER_HOUR)
}

/// Fractional hours in a millisecond span.
pub fn fractional_hours(millis: i64) -> f64 {
    millis as f64 / MILLIS_PER_HOUR as f64
}

/// Serde adapter for `DateTime<Utc>` fields.
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_lenient(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s)))
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` fields. `null` maps to `None`.
pub mod iso_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&super::to_iso(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::parse_lenient(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_roundtrip_is_idempotent() {
        let s = "2025-03-14T08:05:09.123Z";
        let parsed = parse_iso(s).unwrap();
        assert_eq!(to_iso(&parsed), s);
        assert_eq!(parse_iso(&to_iso(&parsed)).unwrap(), parsed);
    }

    #[test]
    fn test_is_iso_timestamp_shape() {
        assert!(is_iso_timestamp("2025-01-01T00:00:00.000Z"));
        assert!(!is_iso_timestamp("2025-01-01T00:00:00Z"));
        assert!(!is_iso_timestamp("2025-01-01T00:00:00.000+01:00"));
        assert!(!is_iso_timestamp("snel"));
        assert!(!is_iso_timestamp(""));
    }

    #[test]
    fn test_parse_iso_rejects_impossible_date() {
        assert!(parse_iso("2025-13-01T00:00:00.000Z").is_none());
    }

    #[test]
    fn test_now_has_millisecond_precision() {
        let t = now();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(parse_iso(&to_iso(&t)).unwrap(), t);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(8 * 3_600_000 + 30 * 60_000), "8h 30m");
        assert_eq!(format_duration(59_999), "0h 0m");
        assert_eq!(format_duration(25 * 3_600_000 + 61_000), "25h 1m");
        assert_eq!(format_duration(-1), "N/A");
    }

    #[test]
    fn test_whole_hours_rounds_down() {
        assert_eq!(whole_hours(3_599_999), 0);
        assert_eq!(whole_hours(7_200_000), 2);
    }

    #[test]
    fn test_serde_adapters() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Sample {
            #[serde(with = "iso")]
            at: DateTime<Utc>,
            #[serde(with = "iso_option", default)]
            until: Option<DateTime<Utc>>,
        }

        let sample = Sample {
            at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            until: None,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"at":"2025-01-02T03:04:05.000Z","until":null}"#);

        let parsed: Sample = serde_json::from_str(r#"{"at":"2025-01-02T03:04:05.000Z"}"#).unwrap();
        assert_eq!(parsed, sample);

        let lenient: Sample = serde_json::from_str(r#"{"at":"2025-01-02T04:04:05+01:00"}"#).unwrap();
        assert_eq!(lenient.at, sample.at);

        assert!(serde_json::from_str::<Sample>(r#"{"at":"yesterday"}"#).is_err());
    }
}
