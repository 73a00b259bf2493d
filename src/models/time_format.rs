//! Lenient parsing of wall-clock times in request payloads.
//!
//! The frontend sends start and end times either as `HH:MM` (from time
//! pickers) or `HH:MM:SS` (echoing values it received). Both are accepted.

use chrono::{NaiveDate, NaiveTime};
use serde::{de::Error, Deserialize, Deserializer};

/// Parse `HH:MM[:SS[.fff]]`
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Parse a `YYYY-MM-DD` date, also accepting a full ISO datetime and keeping
/// only its date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// `Option<NaiveTime>` field; `null` and `""` both mean no time.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| parse_time(&s).ok_or_else(|| D::Error::custom(format!("invalid time: {}", s))))
            .transpose()
    }
}

/// `Option<Option<NaiveTime>>` field for partial updates: absent leaves the
/// value untouched, `null` clears it. Use together with `#[serde(default)]`.
pub mod double_option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<NaiveTime>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        super::option::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "option::deserialize")]
        at: Option<NaiveTime>,
        #[serde(default, deserialize_with = "double_option::deserialize")]
        until: Option<Option<NaiveTime>>,
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("10:00"), NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(parse_time("19:30:15"), NaiveTime::from_hms_opt(19, 30, 15));
        assert_eq!(parse_time("25:00"), None);
    }

    #[test]
    fn test_parse_date_accepts_datetime() {
        assert_eq!(parse_date("2025-03-09"), NaiveDate::from_ymd_opt(2025, 3, 9));
        assert_eq!(parse_date("2025-03-09T00:00:00"), NaiveDate::from_ymd_opt(2025, 3, 9));
        assert_eq!(parse_date("09.03.2025"), None);
    }

    #[test]
    fn test_absent_null_and_value() {
        let p: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(p.at, None);
        assert_eq!(p.until, None);

        let p: Payload = serde_json::from_str(r#"{"at": null, "until": null}"#).unwrap();
        assert_eq!(p.at, None);
        assert_eq!(p.until, Some(None));

        let p: Payload = serde_json::from_str(r#"{"at": "09:15", "until": ""}"#).unwrap();
        assert_eq!(p.at, NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(p.until, Some(None));
    }

    #[test]
    fn test_invalid_time_rejected() {
        assert!(serde_json::from_str::<Payload>(r#"{"at": "noon"}"#).is_err());
    }
}
