//! # Schema
//!
//! A [`Schema`] describes one attribute group: the typed fields stored in a
//! single blob, the formatter that reads and writes that blob, and the group's
//! coercion settings.
//!
//! ## Decode
//!
//! 1. The formatter decodes the raw blob (absent or blank: empty map).
//! 2. Keys that are not declared fields are dropped.
//! 3. With `symbolize_keys`, nested map keys are normalized.
//! 4. Unless `skip_encoding`, each value is parsed through its field type.
//! 5. A new record with an empty blob gets every non-null default materialized.
//!
//! Records loaded from storage never get defaults written into their map;
//! they only see them on read (see [`LazyAttributes`](crate::container::LazyAttributes)).
//!
//! ## Encode
//!
//! Unless `skip_encoding`, each declared field's value is encoded through its
//! type on a copy of the map. The formatter serializes the result.
//!
//! ## Declaring fields
//!
//! ```
//! use serialattrs::config::SchemaDefaults;
//! use serialattrs::registry::default_registry;
//! use serialattrs::schema::Schema;
//! use serialattrs::types::FieldOptions;
//!
//! let schema = Schema::builder("data", default_registry(), &SchemaDefaults::default())
//!     .integer(&["score"], FieldOptions::new().with_default(0))?
//!     .datetime(&["ran_at"], FieldOptions::new())?
//!     .array(&["tags"], FieldOptions::new().item_type("string"))?
//!     .build();
//!
//! assert_eq!(schema.blob_field(), "raw_data");
//! assert!(schema.includes("score"));
//! # Ok::<(), serialattrs::error::AttrError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::SchemaDefaults;
use crate::error::{AttrError, Result};
use crate::format::Formatter;
use crate::registry::TypeRegistry;
use crate::types::{AttributeType, FieldOptions, StringType};
use crate::value::{Map, Value};

/// One declared field: its name and its type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub attr_type: Arc<dyn AttributeType>,
}

impl FieldDescriptor {
    pub fn type_name(&self) -> &str {
        self.attr_type.type_name()
    }

    pub fn is_boolean(&self) -> bool {
        self.attr_type.is_boolean()
    }

    pub fn default_value(&self) -> Value {
        self.attr_type.default_value()
    }
}

#[derive(Debug)]
pub struct Schema {
    group: String,
    blob_field: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    formatter: Arc<dyn Formatter>,
    skip_encoding: bool,
    symbolize_keys: bool,
}

impl Schema {
    /// Start declaring the group `group`.
    pub fn builder(
        group: impl Into<String>,
        registry: Arc<TypeRegistry>,
        defaults: &SchemaDefaults,
    ) -> SchemaBuilder {
        SchemaBuilder {
            group: group.into(),
            blob_field: None,
            formatter: None,
            skip_encoding: None,
            symbolize_keys: None,
            registry,
            defaults: defaults.clone(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Name of the attribute group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Name of the raw storage field backing the group.
    pub fn blob_field(&self) -> &str {
        &self.blob_field
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    pub fn skip_encoding(&self) -> bool {
        self.skip_encoding
    }

    pub fn symbolize_keys(&self) -> bool {
        self.symbolize_keys
    }

    /// Declared fields in declaration order.
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_type(&self, name: &str) -> Option<&Arc<dyn AttributeType>> {
        self.descriptor(name).map(|f| &f.attr_type)
    }

    /// Whether `key` is a declared field.
    pub fn includes(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Declared default for `name`, null for undeclared names.
    pub fn default_for(&self, name: &str) -> Value {
        self.descriptor(name)
            .map(FieldDescriptor::default_value)
            .unwrap_or(Value::Null)
    }

    /// Parse a value written to `name`. Undeclared names and `skip_encoding`
    /// groups keep the value as given.
    pub fn parse_value(&self, name: &str, value: Value) -> Result<Value> {
        match self.field_type(name) {
            Some(t) if !self.skip_encoding => t.parse(value),
            _ => Ok(value),
        }
    }

    /// Encode the value of `name` the way [`Schema::encode`] would.
    pub fn encode_value(&self, name: &str, value: Value) -> Result<Value> {
        match self.field_type(name) {
            Some(t) if !self.skip_encoding => t.encode(value),
            _ => Ok(value),
        }
    }

    /// Serialize an attribute map into a blob.
    pub fn encode(&self, body: &Map) -> Result<String> {
        let raw = if self.skip_encoding {
            self.formatter.encode(body)?
        } else {
            let mut encoded = body.clone();
            for (key, value) in encoded.iter_mut() {
                if let Some(t) = self.field_type(key) {
                    *value = t.encode(std::mem::take(value))?;
                }
            }
            self.formatter.encode(&encoded)?
        };
        debug!(
            group = %self.group,
            bytes = raw.len(),
            skip_encoding = self.skip_encoding,
            "encoded attribute blob"
        );
        Ok(raw)
    }

    /// Decode a blob into the attribute map of one record.
    pub fn decode(&self, raw: Option<&str>, new_record: bool) -> Result<Map> {
        let decoded = self.formatter.decode(raw.unwrap_or_default())?;
        let decoded_len = decoded.len();

        let mut body = Map::new();
        for (key, value) in decoded {
            let Some(field) = self.descriptor(&key) else {
                continue;
            };
            let value = if self.symbolize_keys {
                Self::symbolize_keys_deep(value)
            } else {
                value
            };
            let value = if self.skip_encoding {
                value
            } else {
                field.attr_type.parse(value)?
            };
            body.insert(key, value);
        }
        let dropped = decoded_len - body.len();

        let mut materialized = 0;
        if decoded_len == 0 && new_record {
            for field in &self.fields {
                let default = field.default_value();
                if !default.is_null() {
                    body.insert(field.name.clone(), default);
                    materialized += 1;
                }
            }
        }

        debug!(
            group = %self.group,
            decoded = decoded_len,
            dropped,
            materialized,
            "decoded attribute blob"
        );
        Ok(body)
    }

    /// Recursively normalize every map key inside `value`.
    ///
    /// Keys go through [`StringType::unescape`], the same normalization the
    /// hash type applies to its own keys. Arrays recurse into their elements;
    /// scalars pass through.
    pub fn symbolize_keys_deep(value: Value) -> Value {
        match value {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(Self::symbolize_keys_deep).collect())
            }
            Value::Map(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (StringType::unescape(&k), Self::symbolize_keys_deep(v)))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Builder for [`Schema`]. Field declarations fail on unknown type names.
pub struct SchemaBuilder {
    group: String,
    blob_field: Option<String>,
    formatter: Option<Arc<dyn Formatter>>,
    skip_encoding: Option<bool>,
    symbolize_keys: Option<bool>,
    registry: Arc<TypeRegistry>,
    defaults: SchemaDefaults,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl SchemaBuilder {
    /// Raw storage field name; defaults to `raw_<group>`.
    pub fn blob(mut self, blob_field: impl Into<String>) -> Self {
        self.blob_field = Some(blob_field.into());
        self
    }

    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn skip_encoding(mut self, skip: bool) -> Self {
        self.skip_encoding = Some(skip);
        self
    }

    pub fn symbolize_keys(mut self, symbolize: bool) -> Self {
        self.symbolize_keys = Some(symbolize);
        self
    }

    /// Declare `names` as fields of the registered type `type_name`.
    ///
    /// Re-declaring a name replaces its type and keeps its position.
    pub fn field(mut self, type_name: &str, names: &[&str], options: FieldOptions) -> Result<Self> {
        for name in names {
            let attr_type = self.registry.lookup(type_name, &options)?;
            let descriptor = FieldDescriptor {
                name: name.to_string(),
                attr_type,
            };
            match self.index.get(*name) {
                Some(&i) => self.fields[i] = descriptor,
                None => {
                    self.index.insert(name.to_string(), self.fields.len());
                    self.fields.push(descriptor);
                }
            }
        }
        Ok(self)
    }

    pub fn integer(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("integer", names, options)
    }

    pub fn float(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("float", names, options)
    }

    pub fn boolean(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("boolean", names, options)
    }

    pub fn string(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("string", names, options)
    }

    pub fn time(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("time", names, options)
    }

    pub fn datetime(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("datetime", names, options)
    }

    pub fn array(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("array", names, options)
    }

    pub fn hash(self, names: &[&str], options: FieldOptions) -> Result<Self> {
        self.field("hash", names, options)
    }

    pub fn build(self) -> Schema {
        let blob_field = self
            .blob_field
            .unwrap_or_else(|| format!("raw_{}", self.group));
        let formatter = self.formatter.unwrap_or_else(|| self.defaults.formatter());
        let schema = Schema {
            blob_field,
            formatter,
            skip_encoding: self.skip_encoding.unwrap_or(self.defaults.skip_encoding),
            symbolize_keys: self.symbolize_keys.unwrap_or(self.defaults.symbolize_keys),
            group: self.group,
            fields: self.fields,
            index: self.index,
        };
        debug!(
            group = %schema.group,
            fields = schema.fields.len(),
            formatter = schema.formatter.name(),
            "built attribute schema"
        );
        schema
    }
}

/// Look up a declared field, failing for undeclared names.
pub(crate) fn require_field<'a>(schema: &'a Schema, name: &str) -> Result<&'a FieldDescriptor> {
    schema.descriptor(name).ok_or_else(|| AttrError::UnknownField {
        group: schema.group().to_string(),
        field: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::JsonFormatter;
    use crate::registry::default_registry;

    fn builder() -> SchemaBuilder {
        Schema::builder("data", default_registry(), &SchemaDefaults::default())
    }

    fn sample() -> Schema {
        builder()
            .integer(&["score"], FieldOptions::new().with_default(0))
            .unwrap()
            .datetime(&["ran_at"], FieldOptions::new())
            .unwrap()
            .boolean(&["active"], FieldOptions::new().with_default(false))
            .unwrap()
            .hash(&["extra"], FieldOptions::new())
            .unwrap()
            .build()
    }

    #[test]
    fn construction_defaults() {
        let schema = sample();
        assert_eq!(schema.group(), "data");
        assert_eq!(schema.blob_field(), "raw_data");
        assert_eq!(schema.formatter().name(), "json");
        assert!(!schema.skip_encoding());
        assert!(!schema.symbolize_keys());
    }

    #[test]
    fn builder_options_override_defaults() {
        let defaults = SchemaDefaults {
            skip_encoding: true,
            ..Default::default()
        };
        let schema = Schema::builder("data", default_registry(), &defaults)
            .blob("payload")
            .skip_encoding(false)
            .symbolize_keys(true)
            .build();
        assert_eq!(schema.blob_field(), "payload");
        assert!(!schema.skip_encoding());
        assert!(schema.symbolize_keys());
    }

    #[test]
    fn fields_keep_declaration_order() {
        let names: Vec<_> = sample().field_names().map(String::from).collect();
        assert_eq!(names, vec!["score", "ran_at", "active", "extra"]);
    }

    #[test]
    fn redeclaring_replaces_in_place() {
        let schema = builder()
            .integer(&["a", "b"], FieldOptions::new())
            .unwrap()
            .string(&["a"], FieldOptions::new())
            .unwrap()
            .build();
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.descriptor("a").unwrap().type_name(), "string");
    }

    #[test]
    fn unknown_type_fails_declaration() {
        let result = builder().field("money", &["price"], FieldOptions::new());
        assert!(matches!(result, Err(AttrError::UnknownType(_))));
    }

    #[test]
    fn includes_only_declared_fields() {
        let schema = sample();
        assert!(schema.includes("score"));
        assert!(!schema.includes("bogus"));
    }

    #[test]
    fn decode_drops_undeclared_keys() {
        let schema = sample();
        let body = schema
            .decode(Some(r#"{"score":"7","bogus":1}"#), false)
            .unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body["score"], Value::Integer(7));
    }

    #[test]
    fn decode_materializes_defaults_for_new_records_only() {
        let schema = sample();

        let fresh = schema.decode(None, true).unwrap();
        assert_eq!(fresh.get("score"), Some(&Value::Integer(0)));
        assert_eq!(fresh.get("active"), Some(&Value::Boolean(false)));
        assert_eq!(fresh.get("extra"), Some(&Value::Map(Map::new())));
        assert!(!fresh.contains_key("ran_at"));

        let persisted = schema.decode(Some("{}"), false).unwrap();
        assert!(persisted.is_empty());
    }

    #[test]
    fn decode_keeps_explicit_values_over_defaults() {
        let schema = sample();
        let body = schema.decode(Some(r#"{"score":3}"#), true).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body["score"], Value::Integer(3));
    }

    #[test]
    fn decode_surfaces_parse_and_format_errors() {
        let schema = sample();
        assert!(matches!(
            schema.decode(Some(r#"{"ran_at":"soon"}"#), false),
            Err(AttrError::Parse { .. })
        ));
        assert!(matches!(
            schema.decode(Some("{oops"), false),
            Err(AttrError::Serialization(_))
        ));
    }

    #[test]
    fn encode_runs_field_types() {
        let schema = sample();
        let body = schema
            .decode(Some(r#"{"ran_at":"2024-01-01 10:00:00 +0200","score":5}"#), false)
            .unwrap();
        assert_eq!(
            schema.encode(&body).unwrap(),
            r#"{"ran_at":"2024-01-01T08:00:00Z","score":5}"#
        );
    }

    #[test]
    fn skip_encoding_passes_values_through() {
        let schema = builder()
            .skip_encoding(true)
            .integer(&["score"], FieldOptions::new())
            .unwrap()
            .build();
        let body = schema.decode(Some(r#"{"score":"5"}"#), false).unwrap();
        assert_eq!(body["score"], Value::from("5"));
        assert_eq!(schema.encode(&body).unwrap(), r#"{"score":"5"}"#);
        assert_eq!(
            schema.parse_value("score", Value::from("9")).unwrap(),
            Value::from("9")
        );
    }

    #[test]
    fn skip_encoding_with_time_aware_formatter() {
        let schema = builder()
            .skip_encoding(true)
            .formatter(Arc::new(JsonFormatter::with_time_parsing()))
            .datetime(&["ran_at"], FieldOptions::new())
            .unwrap()
            .build();
        let body = schema
            .decode(Some(r#"{"ran_at":"2024-01-01T00:00:00Z"}"#), false)
            .unwrap();
        assert!(matches!(body["ran_at"], Value::DateTime(_)));
    }

    #[test]
    fn symbolize_keys_deep_recurses() {
        let mut deepest = Map::new();
        deepest.insert(r"\u00fcber".to_string(), Value::from(2));
        let mut inner = Map::new();
        inner.insert(r"\u00e9t\u00e9".to_string(), Value::from(1));
        inner.insert(r"n\u00e9sted".to_string(), Value::Map(deepest));
        let mut outer = Map::new();
        outer.insert(r"k\u00e9y".to_string(), Value::Array(vec![Value::Map(inner)]));

        let symbolized = Schema::symbolize_keys_deep(Value::Map(outer));
        let outer = symbolized.as_map().unwrap();
        assert!(!outer.contains_key(r"k\u00e9y"));
        let list = outer["kéy"].as_array().unwrap();
        let inner = list[0].as_map().unwrap();
        assert_eq!(inner["été"], Value::from(1));
        assert_eq!(inner["nésted"].as_map().unwrap()["über"], Value::from(2));
        assert_eq!(Schema::symbolize_keys_deep(Value::from(3)), Value::from(3));
    }

    #[test]
    fn symbolize_keys_applies_on_decode() {
        let schema = builder()
            .symbolize_keys(true)
            .skip_encoding(true)
            .hash(&["extra"], FieldOptions::new())
            .unwrap()
            .build();
        let body = schema
            .decode(Some(r#"{"extra":{"caf\\u00e9":[{"n\\u00e9":1}]}}"#), false)
            .unwrap();
        let extra = body["extra"].as_map().unwrap();
        let list = extra["café"].as_array().unwrap();
        assert!(list[0].as_map().unwrap().contains_key("né"));
    }

    #[test]
    fn default_for_undeclared_is_null() {
        let schema = sample();
        assert_eq!(schema.default_for("score"), Value::Integer(0));
        assert_eq!(schema.default_for("bogus"), Value::Null);
    }

    #[test]
    fn require_field_reports_group() {
        let schema = sample();
        let err = require_field(&schema, "bogus").unwrap_err();
        assert_eq!(err.to_string(), "Unknown field bogus in group data");
    }
}
