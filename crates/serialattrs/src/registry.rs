//! # Type Registry
//!
//! Maps type names to constructors, and value kinds to type names.
//!
//! The registry is assembled while it is still uniquely owned (`register`,
//! `register_kind` take `&mut self`), then frozen behind an [`Arc`] and handed
//! to [`Schema`](crate::schema::Schema) construction. Array and hash types keep
//! a handle to it so they can infer item types from values at parse time.
//!
//! ```
//! use std::sync::Arc;
//! use serialattrs::registry::TypeRegistry;
//! use serialattrs::types::{FieldOptions, IntegerType};
//!
//! let mut registry = TypeRegistry::with_builtins();
//! registry.register("counter", |options, _| Ok(Arc::new(IntegerType::new(options))));
//! let registry = Arc::new(registry);
//!
//! assert!(registry.lookup("counter", &FieldOptions::default()).is_ok());
//! assert!(registry.lookup("money", &FieldOptions::default()).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{AttrError, Result};
use crate::types::{
    ArrayType, AttributeType, BooleanType, FieldOptions, FloatType, HashType, IntegerType,
    StringType, TimeType,
};
use crate::value::ValueKind;

/// Builds a type instance from per-field options.
pub type TypeConstructor = Arc<
    dyn Fn(&FieldOptions, &Arc<TypeRegistry>) -> Result<Arc<dyn AttributeType>> + Send + Sync,
>;

static DEFAULT_REGISTRY: Lazy<Arc<TypeRegistry>> =
    Lazy::new(|| Arc::new(TypeRegistry::with_builtins()));

/// The shared registry holding only the built-in types.
pub fn default_registry() -> Arc<TypeRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

#[derive(Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, TypeConstructor>,
    kinds: HashMap<ValueKind, String>,
}

impl TypeRegistry {
    /// An empty registry with no types and no inference.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the eight built-in types and their inference mapping.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("integer", |o, _| Ok(Arc::new(IntegerType::new(o))));
        registry.register("float", |o, _| Ok(Arc::new(FloatType::new(o))));
        registry.register("boolean", |o, _| Ok(Arc::new(BooleanType::new(o))));
        registry.register("string", |o, _| Ok(Arc::new(StringType::new(o))));
        registry.register("time", |o, _| Ok(Arc::new(TimeType::time(o))));
        registry.register("datetime", |o, _| Ok(Arc::new(TimeType::datetime(o))));
        registry.register("array", |o, r| Ok(Arc::new(ArrayType::new(o, r)?)));
        registry.register("hash", |o, r| Ok(Arc::new(HashType::new(o, r)?)));

        registry.register_kind(ValueKind::Integer, "integer");
        registry.register_kind(ValueKind::Float, "float");
        registry.register_kind(ValueKind::Boolean, "boolean");
        registry.register_kind(ValueKind::String, "string");
        registry.register_kind(ValueKind::Time, "time");
        registry.register_kind(ValueKind::DateTime, "datetime");
        registry.register_kind(ValueKind::Array, "array");
        registry.register_kind(ValueKind::Map, "hash");
        registry
    }

    /// Add or replace the constructor for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&FieldOptions, &Arc<TypeRegistry>) -> Result<Arc<dyn AttributeType>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        debug!(type_name = %name, "registering attribute type");
        self.constructors.insert(name, Arc::new(constructor));
    }

    /// Infer values of `kind` as the type registered under `name`.
    pub fn register_kind(&mut self, kind: ValueKind, name: impl Into<String>) {
        self.kinds.insert(kind, name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the type registered under `name`.
    pub fn lookup(
        self: &Arc<Self>,
        name: &str,
        options: &FieldOptions,
    ) -> Result<Arc<dyn AttributeType>> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| AttrError::UnknownType(name.to_string()))?;
        constructor(options, self)
    }

    /// Construct the type inferred for values of `kind`.
    ///
    /// Returns `None` for kinds without a mapping (null included); callers
    /// fall back to the string type.
    pub fn lookup_kind(self: &Arc<Self>, kind: ValueKind) -> Option<Arc<dyn AttributeType>> {
        let name = self.kinds.get(&kind)?;
        match self.lookup(name, &FieldOptions::default()) {
            Ok(found) => Some(found),
            Err(e) => {
                debug!(kind = kind.name(), error = %e, "type inference failed");
                None
            }
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.names())
            .field("kinds", &self.kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["array", "boolean", "datetime", "float", "hash", "integer", "string", "time"]
        );
    }

    #[test]
    fn lookup_passes_options() {
        let registry = default_registry();
        let t = registry
            .lookup("integer", &FieldOptions::new().with_default(5))
            .unwrap();
        assert_eq!(t.type_name(), "integer");
        assert_eq!(t.default_value(), Value::Integer(5));
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = default_registry()
            .lookup("money", &FieldOptions::default())
            .unwrap_err();
        assert!(matches!(err, AttrError::UnknownType(name) if name == "money"));
    }

    #[test]
    fn kind_lookup() {
        let registry = default_registry();
        assert_eq!(
            registry.lookup_kind(ValueKind::Integer).unwrap().type_name(),
            "integer"
        );
        assert_eq!(registry.lookup_kind(ValueKind::Map).unwrap().type_name(), "hash");
        assert!(registry.lookup_kind(ValueKind::Null).is_none());
    }

    #[test]
    fn empty_registry_infers_nothing() {
        let registry = Arc::new(TypeRegistry::new());
        assert!(registry.lookup_kind(ValueKind::String).is_none());
    }

    #[test]
    fn registration_replaces_existing_names() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register("string", |o, _| Ok(Arc::new(IntegerType::new(o))));
        let registry = Arc::new(registry);

        let replaced = registry.lookup("string", &FieldOptions::default()).unwrap();
        assert_eq!(replaced.type_name(), "integer");
        // inference follows the name, so strings now infer the replacement
        assert_eq!(
            registry.lookup_kind(ValueKind::String).unwrap().type_name(),
            "integer"
        );
    }

    #[test]
    fn kind_mapping_can_be_redirected() {
        let mut registry = TypeRegistry::with_builtins();
        registry.register_kind(ValueKind::Float, "string");
        let registry = Arc::new(registry);
        assert_eq!(
            registry.lookup_kind(ValueKind::Float).unwrap().type_name(),
            "string"
        );
    }
}
