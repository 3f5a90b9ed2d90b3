use std::sync::Arc;

use super::{AttributeType, FieldOptions, StringType};
use crate::error::{AttrError, Result};
use crate::registry::TypeRegistry;
use crate::value::Value;

/// Array of homogeneous items.
///
/// The item type is the declared `item_type`, or else the type inferred from
/// the first non-null element, or else `string`. That single type is applied
/// to every element: mixed-kind arrays are coerced to the kind of their first
/// element. Null elements stay null; `false` is parsed like any other value.
#[derive(Debug)]
pub struct ArrayType {
    default: Value,
    item_type: Option<Arc<dyn AttributeType>>,
    registry: Arc<TypeRegistry>,
}

impl ArrayType {
    pub fn new(options: &FieldOptions, registry: &Arc<TypeRegistry>) -> Result<Self> {
        let item_type = match options.item_type.as_deref() {
            Some(name) => Some(registry.lookup(name, &FieldOptions::default())?),
            None => None,
        };
        Ok(Self {
            default: options
                .default
                .clone()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            item_type,
            registry: Arc::clone(registry),
        })
    }

    fn item_type_for(&self, items: &[Value]) -> Arc<dyn AttributeType> {
        if let Some(item_type) = &self.item_type {
            return Arc::clone(item_type);
        }
        items
            .iter()
            .find(|item| !item.is_null())
            .and_then(|item| self.registry.lookup_kind(item.kind()))
            .unwrap_or_else(|| Arc::new(StringType::default()))
    }

    fn map_items(
        &self,
        input: Value,
        op: impl Fn(&dyn AttributeType, Value) -> Result<Value>,
        fail: impl FnOnce(Value) -> AttrError,
    ) -> Result<Value> {
        match input {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => {
                let item_type = self.item_type_for(&items);
                items
                    .into_iter()
                    .map(|item| {
                        if item.is_null() {
                            Ok(Value::Null)
                        } else {
                            op(item_type.as_ref(), item)
                        }
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            other => Err(fail(other)),
        }
    }
}

impl AttributeType for ArrayType {
    fn type_name(&self) -> &str {
        "array"
    }

    fn default_value(&self) -> Value {
        self.default.clone()
    }

    fn parse(&self, input: Value) -> Result<Value> {
        self.map_items(
            input,
            |item_type, item| item_type.parse(item),
            |other| AttrError::parse("array", other.to_json(), "not an array"),
        )
    }

    fn encode(&self, value: Value) -> Result<Value> {
        self.map_items(
            value,
            |item_type, item| item_type.encode(item),
            |other| AttrError::encode("array", other.to_json(), "not an array"),
        )
    }
}
