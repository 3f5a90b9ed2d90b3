//! Time and datetime types.
//!
//! Both parse the same inputs and encode to the same UTC timestamp format
//! (`YYYY-MM-DDTHH:MM:SSZ`); they differ only in which [`Value`] variant they
//! produce, so that untyped containers infer the matching type back.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use super::{AttributeType, FieldOptions};
use crate::error::{AttrError, Result};
use crate::value::Value;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse the timestamp forms accepted in blobs and setters.
///
/// Offset-less forms are read as UTC.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(t) = DateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc().fixed_offset())
}

/// XML-schema timestamp in UTC, whole seconds.
pub(crate) fn xmlschema(t: &DateTime<FixedOffset>) -> String {
    t.with_timezone(&Utc)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn from_epoch(secs: f64) -> Option<DateTime<FixedOffset>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|t| t.fixed_offset())
}

#[derive(Debug, Clone)]
pub struct TimeType {
    default: Value,
    datetime: bool,
}

impl TimeType {
    /// The `time` type, producing [`Value::Time`].
    pub fn time(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
            datetime: false,
        }
    }

    /// The `datetime` type, producing [`Value::DateTime`].
    pub fn datetime(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
            datetime: true,
        }
    }

    fn wrap(&self, t: DateTime<FixedOffset>) -> Value {
        if self.datetime {
            Value::DateTime(t)
        } else {
            Value::Time(t)
        }
    }
}

impl AttributeType for TimeType {
    fn type_name(&self) -> &str {
        if self.datetime {
            "datetime"
        } else {
            "time"
        }
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        if input.is_blank() {
            return Ok(Value::Null);
        }
        let parsed = match input {
            Value::Time(t) | Value::DateTime(t) => Some(t),
            Value::String(ref s) => parse_timestamp(s),
            Value::Integer(n) => from_epoch(n as f64),
            Value::Float(f) => from_epoch(f),
            _ => None,
        };
        match parsed {
            Some(t) => Ok(self.wrap(t)),
            None => Err(AttrError::parse(
                self.type_name(),
                input.to_json(),
                "not a recognizable timestamp",
            )),
        }
    }

    fn encode(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Time(t) | Value::DateTime(t) => Ok(Value::String(xmlschema(&t))),
            Value::String(s) => parse_timestamp(&s)
                .map(|t| Value::String(xmlschema(&t)))
                .ok_or_else(|| AttrError::encode(self.type_name(), &s, "not a timestamp")),
            other => Err(AttrError::encode(
                self.type_name(),
                other.to_json(),
                "not a timestamp",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().fixed_offset()
    }

    #[test]
    fn parses_common_forms() {
        let expected = utc(2024, 3, 1, 12, 30, 0);
        for input in [
            "2024-03-01T12:30:00Z",
            "2024-03-01T14:30:00+02:00",
            "2024-03-01 12:30:00 +0000",
            "2024-03-01 12:30:00",
            "2024-03-01T12:30:00",
        ] {
            assert_eq!(parse_timestamp(input), Some(expected), "input: {input}");
        }
        assert_eq!(parse_timestamp("2024-03-01"), Some(utc(2024, 3, 1, 0, 0, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn blank_parses_to_null() {
        let t = TimeType::time(&FieldOptions::default());
        assert_eq!(t.parse(Value::Null).unwrap(), Value::Null);
        assert_eq!(t.parse(Value::from("")).unwrap(), Value::Null);
    }

    #[test]
    fn typed_values_are_retagged() {
        let at = utc(2020, 1, 2, 3, 4, 5);
        let time = TimeType::time(&FieldOptions::default());
        let datetime = TimeType::datetime(&FieldOptions::default());

        assert_eq!(time.parse(Value::DateTime(at)).unwrap(), Value::Time(at));
        assert_eq!(datetime.parse(Value::Time(at)).unwrap(), Value::DateTime(at));
    }

    #[test]
    fn epoch_seconds() {
        let time = TimeType::time(&FieldOptions::default());
        assert_eq!(
            time.parse(Value::from(86_400)).unwrap(),
            Value::Time(utc(1970, 1, 2, 0, 0, 0))
        );
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let datetime = TimeType::datetime(&FieldOptions::default());
        let err = datetime.parse(Value::from("not a date")).unwrap_err();
        assert!(matches!(err, AttrError::Parse { .. }));
        assert!(datetime.parse(Value::Boolean(true)).is_err());
    }

    #[test]
    fn encodes_as_utc_xmlschema() {
        let datetime = TimeType::datetime(&FieldOptions::default());
        let at = DateTime::parse_from_rfc3339("2024-03-01T14:30:00+02:00").unwrap();
        assert_eq!(
            datetime.encode(Value::DateTime(at)).unwrap(),
            Value::from("2024-03-01T12:30:00Z")
        );
        assert_eq!(datetime.encode(Value::Null).unwrap(), Value::Null);
        assert_eq!(
            datetime.encode(Value::from("2024-03-01 12:30:00")).unwrap(),
            Value::from("2024-03-01T12:30:00Z")
        );
        assert!(datetime.encode(Value::from(1)).is_err());
    }

    #[test]
    fn round_trip_keeps_the_instant() {
        let time = TimeType::time(&FieldOptions::default());
        let at = Value::Time(utc(1999, 12, 31, 23, 59, 59));
        let encoded = time.encode(at.clone()).unwrap();
        assert_eq!(time.parse(encoded).unwrap(), at);
    }
}
