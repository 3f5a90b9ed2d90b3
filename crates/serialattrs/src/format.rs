//! Blob formatters.
//!
//! A [`Formatter`] turns a decoded attribute map into the blob string and
//! back. Schemas own one behind an `Arc`, so implementations must be
//! `Send + Sync` and stateless per call.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AttrError, Result};
use crate::types::time::parse_timestamp;
use crate::value::{Map, Value};

/// Codec between an attribute map and its blob text.
pub trait Formatter: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, body: &Map) -> Result<String>;

    /// Decode a blob. A blank blob decodes to an empty map.
    fn decode(&self, raw: &str) -> Result<Map>;
}

static JSON_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)?$")
        .expect("valid timestamp pattern")
});

/// JSON object formatter, the default.
///
/// With [`JsonFormatter::with_time_parsing`], strings shaped like ISO 8601
/// timestamps are decoded into [`Value::DateTime`] wherever they appear. Groups
/// that skip encoding rely on this to read typed timestamps back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormatter {
    parse_times: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_parsing() -> Self {
        Self { parse_times: true }
    }

    fn convert_times(value: Value) -> Value {
        match value {
            Value::String(s) if JSON_TIME.is_match(&s) => match parse_timestamp(&s) {
                Some(t) => Value::DateTime(t),
                None => Value::String(s),
            },
            Value::Array(items) => {
                Value::Array(items.into_iter().map(Self::convert_times).collect())
            }
            Value::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::convert_times(v)))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, body: &Map) -> Result<String> {
        let object: serde_json::Map<String, serde_json::Value> =
            body.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
        Ok(serde_json::to_string(&object)?)
    }

    fn decode(&self, raw: &str) -> Result<Map> {
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        let body = match Value::from_json(serde_json::from_str(raw)?) {
            Value::Map(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(AttrError::Format(format!(
                    "expected a JSON object, found {}",
                    other.kind().name()
                )))
            }
        };
        if !self.parse_times {
            return Ok(body);
        }
        Ok(body
            .into_iter()
            .map(|(k, v)| (k, Self::convert_times(v)))
            .collect())
    }
}
