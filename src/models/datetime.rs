//! Lenient timestamp handling.
//!
//! Clients send `datetime-local` values without seconds, CSV exports use
//! US dates, and older rows were written by other tools. Everything is
//! normalized to a naive timestamp and stored as `YYYY-MM-DD HH:MM:SS`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

/// Storage format for TEXT timestamp columns.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse any of the accepted timestamp spellings.
pub fn parse_flexible(raw: &str) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn to_storage(dt: &NaiveDateTime) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

/// Read a stored timestamp, tolerating anything `parse_flexible` accepts.
pub fn from_storage(raw: Option<String>) -> Option<NaiveDateTime> {
    raw.as_deref().and_then(parse_flexible)
}

/// `#[serde(with = "flexible")]` for required timestamps.
pub mod flexible {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_flexible(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {raw}")))
    }
}

/// `#[serde(with = "flexible_option")]` for nullable timestamps.
pub mod flexible_option {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => flexible::serialize(dt, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse_flexible(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime: {raw}"))),
        }
    }
}

/// Patch variant: absent = `None`, `null` = `Some(None)`.
pub fn deserialize_patch<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Option<NaiveDateTime>>, D::Error> {
    flexible_option::deserialize(d).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn accepts_html_datetime_local() {
        let dt = parse_flexible("2025-03-04T09:30").unwrap();
        assert_eq!(to_storage(&dt), "2025-03-04 09:30:00");
    }

    #[test]
    fn accepts_rfc3339_with_offset() {
        let dt = parse_flexible("2025-03-04T09:30:00-08:00").unwrap();
        assert_eq!(dt.hour(), 17);
    }

    #[test]
    fn accepts_us_formats() {
        assert_eq!(
            to_storage(&parse_flexible("03/04/2025").unwrap()),
            "2025-03-04 00:00:00"
        );
        assert_eq!(
            to_storage(&parse_flexible("03/04/25 14:05").unwrap()),
            "2025-03-04 14:05:00"
        );
    }

    #[test]
    fn accepts_fractional_seconds() {
        let dt = parse_flexible("2025-03-04T09:30:15.123456").unwrap();
        assert_eq!(dt.second(), 15);
    }

    #[test]
    fn rejects_garbage_and_blank() {
        assert!(parse_flexible("next tuesday").is_none());
        assert!(parse_flexible("   ").is_none());
    }

    #[test]
    fn serializes_iso_without_space() {
        #[derive(serde::Serialize)]
        struct Wrap {
            #[serde(with = "flexible")]
            at: NaiveDateTime,
        }
        let at = parse_flexible("2025-01-02 03:04:05").unwrap();
        let json = serde_json::to_string(&Wrap { at }).unwrap();
        assert_eq!(json, r#"{"at":"2025-01-02T03:04:05"}"#);
    }
}
