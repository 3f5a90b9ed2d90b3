//! Integer, float, boolean and string types.
//!
//! Numeric conversion of strings is lenient: the leading numeric prefix is
//! used and a string without one converts to zero, so `"12px"` is 12 and
//! `"abc"` is 0.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{AttributeType, FieldOptions};
use crate::error::{AttrError, Result};
use crate::value::Value;

static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?\d[\d_]*").expect("valid integer pattern"));

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d[\d_]*(?:\.\d+)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("valid float pattern")
});

static UNICODE_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("valid escape pattern"));

/// Leading integer of a string, `Some(0)` when there is none.
/// Returns `None` when the digits do not fit in an `i64`.
pub(crate) fn leading_integer(s: &str) -> Option<i64> {
    match LEADING_INTEGER.find(s) {
        Some(m) => m
            .as_str()
            .trim_start()
            .replace('_', "")
            .parse::<i64>()
            .ok(),
        None => Some(0),
    }
}

/// Leading decimal number of a string, `0.0` when there is none.
pub(crate) fn leading_float(s: &str) -> f64 {
    LEADING_FLOAT
        .find(s)
        .and_then(|m| m.as_str().trim_start().replace('_', "").parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn truncate_float(f: f64) -> Option<i64> {
    let t = f.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(t as i64)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegerType {
    default: Value,
}

impl IntegerType {
    pub fn new(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
        }
    }
}

impl AttributeType for IntegerType {
    fn type_name(&self) -> &str {
        "integer"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        if input.is_blank() {
            return Ok(Value::Null);
        }
        match input {
            Value::Integer(n) => Ok(Value::Integer(n)),
            Value::Float(f) => truncate_float(f)
                .map(Value::Integer)
                .ok_or_else(|| AttrError::parse("integer", f, "out of range")),
            Value::String(s) => leading_integer(&s)
                .map(Value::Integer)
                .ok_or_else(|| AttrError::parse("integer", &s, "out of range")),
            Value::Time(t) | Value::DateTime(t) => Ok(Value::Integer(t.timestamp())),
            other => Err(AttrError::parse(
                "integer",
                other.to_json(),
                "not convertible to an integer",
            )),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FloatType {
    default: Value,
}

impl FloatType {
    pub fn new(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
        }
    }
}

impl AttributeType for FloatType {
    fn type_name(&self) -> &str {
        "float"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        if input.is_blank() {
            return Ok(Value::Null);
        }
        match input {
            Value::Float(f) => Ok(Value::Float(f)),
            Value::Integer(n) => Ok(Value::Float(n as f64)),
            Value::String(s) => Ok(Value::Float(leading_float(&s))),
            Value::Time(t) | Value::DateTime(t) => Ok(Value::Float(
                t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) / 1e9,
            )),
            other => Err(AttrError::parse(
                "float",
                other.to_json(),
                "not convertible to a float",
            )),
        }
    }
}

/// Boolean coercion.
///
/// Order matters and is part of the contract:
/// 1. the literal strings `"true"` and `"false"`;
/// 2. numeric-like input, true when its integer value is positive
///    (`"1"`, `1`, `2.7`; but also `"yes"`, which has no digits and is false);
/// 3. anything else passes through unchanged.
#[derive(Debug, Clone, Default)]
pub struct BooleanType {
    default: Value,
}

impl BooleanType {
    pub fn new(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
        }
    }
}

impl AttributeType for BooleanType {
    fn type_name(&self) -> &str {
        "boolean"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        let parsed = match input {
            Value::String(s) if s == "true" => Value::Boolean(true),
            Value::String(s) if s == "false" => Value::Boolean(false),
            Value::String(s) => match leading_integer(&s) {
                Some(n) => Value::Boolean(n > 0),
                // too many digits to fit, only the sign decides
                None => Value::Boolean(!s.trim_start().starts_with('-')),
            },
            Value::Integer(n) => Value::Boolean(n > 0),
            Value::Float(f) => Value::Boolean(f.trunc() > 0.0),
            Value::Time(t) | Value::DateTime(t) => Value::Boolean(t.timestamp() > 0),
            other => other,
        };
        Ok(parsed)
    }

    fn is_boolean(&self) -> bool {
        true
    }
}

/// String coercion with `\uXXXX` escape decoding.
///
/// Escapes left over from a double-encoding step are turned back into the
/// characters they name. Escapes that decode to U+0000 or to a surrogate are
/// kept verbatim.
#[derive(Debug, Clone, Default)]
pub struct StringType {
    default: Value,
}

impl StringType {
    pub fn new(options: &FieldOptions) -> Self {
        Self {
            default: options.default_or_null(),
        }
    }

    /// Replace every `\uXXXX` escape in `s` with its character.
    pub fn unescape(s: &str) -> String {
        UNICODE_ESCAPE
            .replace_all(s, |caps: &Captures<'_>| {
                let code = u32::from_str_radix(&caps[1], 16).unwrap_or(0);
                if code == 0 {
                    return caps[0].to_string();
                }
                match char::from_u32(code) {
                    Some(c) => c.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

impl AttributeType for StringType {
    fn type_name(&self) -> &str {
        "string"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        let s = match input {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Value::String(Self::unescape(&s)))
    }
}
