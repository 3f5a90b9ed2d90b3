//! # Lazy attribute container
//!
//! One [`LazyAttributes`] holds the decoded attribute map of one group on one
//! record. The blob is decoded on first access and at most once until
//! [`LazyAttributes::reset`]; concurrent first reads share a single decode.
//!
//! Reads of absent fields return the declared default without storing it, so
//! a record that was never written re-encodes to the blob it was loaded from
//! (minus undeclared keys).
//!
//! Writes parse the value through the field type, record the pre-write value
//! the first time a field is written, and store the result. Writing null
//! removes the key. A field stays changed until reset, even if a later write
//! restores its original value.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::error::Result;
use crate::schema::Schema;
use crate::value::{Map, Value};

/// Where a container reads its blob from on first access.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlobSource<'a> {
    pub raw: Option<&'a str>,
    pub new_record: bool,
}

impl<'a> BlobSource<'a> {
    pub fn persisted(raw: Option<&'a str>) -> Self {
        Self {
            raw,
            new_record: false,
        }
    }

    pub fn fresh(raw: Option<&'a str>) -> Self {
        Self {
            raw,
            new_record: true,
        }
    }
}

#[derive(Debug)]
pub struct LazyAttributes {
    schema: Arc<Schema>,
    data: OnceCell<Map>,
    changes: BTreeMap<String, Value>,
}

impl LazyAttributes {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            data: OnceCell::new(),
            changes: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Whether the blob has been decoded since creation or the last reset.
    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    /// Decode the blob if that has not happened yet.
    pub fn load(&self, source: BlobSource<'_>) -> Result<&Map> {
        self.data.get_or_try_init(|| {
            trace!(group = self.schema.group(), "decoding attribute blob");
            self.schema.decode(source.raw, source.new_record)
        })
    }

    /// Current value of `name`: the stored value, else the declared default.
    pub fn get(&self, source: BlobSource<'_>, name: &str) -> Result<Value> {
        let data = self.load(source)?;
        Ok(data
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.schema.default_for(name)))
    }

    /// Stored value of `name`, without falling back to the default.
    pub fn stored(&self, source: BlobSource<'_>, name: &str) -> Result<Option<Value>> {
        Ok(self.load(source)?.get(name).cloned())
    }

    /// Parse and store `value` under `name`, returning the parsed value.
    pub fn write(&mut self, source: BlobSource<'_>, name: &str, value: Value) -> Result<Value> {
        let parsed = self.schema.parse_value(name, value)?;
        let before = self.get(source, name)?;
        self.changes.entry(name.to_string()).or_insert(before);
        trace!(group = self.schema.group(), field = name, "attribute written");
        if let Some(data) = self.data.get_mut() {
            if parsed.is_null() {
                data.remove(name);
            } else {
                data.insert(name.to_string(), parsed.clone());
            }
        }
        Ok(parsed)
    }

    /// Names of fields written since the last reset.
    pub fn changed_fields(&self) -> Vec<String> {
        self.changes.keys().cloned().collect()
    }

    pub fn is_changed(&self, name: &str) -> bool {
        self.changes.contains_key(name)
    }

    /// `(before, current)` for a field written since the last reset.
    pub fn change_for(&self, source: BlobSource<'_>, name: &str) -> Result<Option<(Value, Value)>> {
        match self.changes.get(name) {
            Some(before) => Ok(Some((before.clone(), self.get(source, name)?))),
            None => Ok(None),
        }
    }

    /// Whether any field of this group was written since the last reset.
    pub fn any_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Names present in the decoded map.
    pub fn present_names(&self, source: BlobSource<'_>) -> Result<Vec<String>> {
        Ok(self.load(source)?.keys().cloned().collect())
    }

    /// Serialize the current map.
    pub fn encode(&self, source: BlobSource<'_>) -> Result<String> {
        let data = self.load(source)?;
        self.schema.encode(data)
    }

    /// Drop the decoded map and the change log; the next access re-decodes.
    pub fn reset(&mut self) {
        self.data.take();
        self.changes.clear();
    }
}
