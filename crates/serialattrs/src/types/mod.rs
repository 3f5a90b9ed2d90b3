//! # Attribute Types
//!
//! An attribute type converts between the values stored in a blob (whatever
//! the formatter decoded) and the runtime values handed to callers.
//!
//! | Name | Type | Parses from |
//! |------|------|-------------|
//! | `integer` | [`IntegerType`] | numbers, numeric strings, times |
//! | `float` | [`FloatType`] | numbers, numeric strings, times |
//! | `boolean` | [`BooleanType`] | `"true"`/`"false"`, numeric-like values |
//! | `string` | [`StringType`] | anything, decoding `\uXXXX` escapes |
//! | `time` | [`TimeType`] | timestamps, time strings, epoch seconds |
//! | `datetime` | [`TimeType`] | same as `time`, tagged as datetime |
//! | `array` | [`ArrayType`] | arrays, one item type for every element |
//! | `hash` | [`HashType`] | maps, one type per key |
//!
//! ## Round-trip law
//!
//! For every value `x` a type accepts, `parse(encode(x))` is observably equal
//! to `x`. Two documented exceptions exist: the boolean type maps numeric-like
//! strings to booleans, and the string type keeps `\u0000` escapes verbatim.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::value::Value;

mod array;
mod hash;
mod scalar;
pub(crate) mod time;

pub use array::ArrayType;
pub use hash::HashType;
pub use scalar::{BooleanType, FloatType, IntegerType, StringType};
pub use time::TimeType;

/// A coercion strategy for one declared attribute.
///
/// Instances are long-lived: one is built per declared field and shared by
/// every record of the host type.
pub trait AttributeType: fmt::Debug + Send + Sync {
    /// The registered name of this type, used in error messages.
    fn type_name(&self) -> &str;

    /// Value returned for the field when nothing is stored.
    fn default_value(&self) -> Value;

    /// Blob-native value to runtime value.
    fn parse(&self, input: Value) -> Result<Value>;

    /// Runtime value to blob-native value.
    fn encode(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    /// Boolean fields get a truthiness accessor on the host record.
    fn is_boolean(&self) -> bool {
        false
    }
}

/// Per-field declaration options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOptions {
    /// Declared default, returned for absent fields.
    pub default: Option<Value>,
    /// Item type name for `array` fields.
    pub item_type: Option<String>,
    /// Per-key type names for `hash` fields.
    pub types: BTreeMap<String, String>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn item_type(mut self, type_name: impl Into<String>) -> Self {
        self.item_type = Some(type_name.into());
        self
    }

    pub fn key_type(mut self, key: impl ToString, type_name: impl Into<String>) -> Self {
        self.types.insert(key.to_string(), type_name.into());
        self
    }

    pub(crate) fn default_or_null(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder_collects_everything() {
        let options = FieldOptions::new()
            .with_default(3)
            .item_type("integer")
            .key_type("n", "integer");

        assert_eq!(options.default, Some(Value::Integer(3)));
        assert_eq!(options.item_type.as_deref(), Some("integer"));
        assert_eq!(options.types.get("n").map(String::as_str), Some("integer"));
    }

    #[test]
    fn missing_default_is_null() {
        assert_eq!(FieldOptions::new().default_or_null(), Value::Null);
    }
}
