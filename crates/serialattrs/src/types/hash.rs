use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AttributeType, FieldOptions, StringType};
use crate::error::{AttrError, Result};
use crate::registry::TypeRegistry;
use crate::value::{Map, Value};

/// Map with per-key types.
///
/// Each entry's type is resolved in order: the declared type for its key,
/// the type inferred from a non-null value, then `string`. Keys are
/// normalized through [`StringType::unescape`].
#[derive(Debug)]
pub struct HashType {
    default: Value,
    types: BTreeMap<String, Arc<dyn AttributeType>>,
    key_type: Arc<dyn AttributeType>,
    registry: Arc<TypeRegistry>,
}

impl HashType {
    pub fn new(options: &FieldOptions, registry: &Arc<TypeRegistry>) -> Result<Self> {
        let types = options
            .types
            .iter()
            .map(|(key, name)| {
                registry
                    .lookup(name, &FieldOptions::default())
                    .map(|t| (key.clone(), t))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            default: options
                .default
                .clone()
                .unwrap_or_else(|| Value::Map(Map::new())),
            types,
            key_type: Arc::new(StringType::default()),
            registry: Arc::clone(registry),
        })
    }

    fn type_for(&self, key: &str, value: &Value) -> Arc<dyn AttributeType> {
        if let Some(declared) = self.types.get(key) {
            return Arc::clone(declared);
        }
        if !value.is_null() {
            if let Some(inferred) = self.registry.lookup_kind(value.kind()) {
                return inferred;
            }
        }
        Arc::clone(&self.key_type)
    }
}

impl AttributeType for HashType {
    fn type_name(&self) -> &str {
        "hash"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        match input {
            Value::Null => Ok(Value::Null),
            Value::Map(map) => {
                let mut parsed = Map::new();
                for (key, value) in map {
                    let key = StringType::unescape(&key);
                    let value = self.type_for(&key, &value).parse(value)?;
                    parsed.insert(key, value);
                }
                Ok(Value::Map(parsed))
            }
            other => Err(AttrError::parse("hash", other.to_json(), "not a map")),
        }
    }

    fn encode(&self, value: Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Map(map) => {
                let mut encoded = Map::new();
                for (key, value) in map {
                    let value = self.type_for(&key, &value).encode(value)?;
                    encoded.insert(key, value);
                }
                Ok(Value::Map(encoded))
            }
            other => Err(AttrError::encode("hash", other.to_json(), "not a map")),
        }
    }
}
