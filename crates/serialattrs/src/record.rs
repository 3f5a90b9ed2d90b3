//! # Host records
//!
//! A [`RecordType`] is a named host type holding one [`Schema`] per attribute
//! group. A [`Record`] is one instance: an id, a new-record flag, the raw blob
//! of every group and one [`LazyAttributes`] container per group.
//!
//! ## Lifecycle
//!
//! ```text
//! new_record() ──write──▶ save(store) ──▶ reload(store) ──▶ ...
//!                           │                 │
//!                           ▼                 ▼
//!                     prepare_save:      reset every
//!                     encode groups      container
//!                     into blobs
//! ```
//!
//! - Saving re-encodes every group into its blob and clears the new-record
//!   flag. Change tracking is kept until the next reload.
//! - Reloading replaces the blobs with the stored ones and resets the
//!   containers, so the next access decodes again with no changes recorded.
//!
//! ## Accessors
//!
//! All field accessors take `(group, field)` and fail with
//! [`AttrError::UnknownGroup`] or [`AttrError::UnknownField`] for names that
//! were never declared.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};
use uuid::Uuid;

use crate::container::{BlobSource, LazyAttributes};
use crate::error::{AttrError, Result};
use crate::schema::{require_field, Schema};
use crate::store::{Blobs, RecordStore};
use crate::value::Value;

#[derive(Debug)]
pub struct RecordType {
    name: String,
    groups: Vec<Arc<Schema>>,
    index: HashMap<String, usize>,
}

pub struct RecordTypeBuilder {
    name: String,
    groups: Vec<Arc<Schema>>,
    index: HashMap<String, usize>,
}

impl RecordTypeBuilder {
    /// Attach a group. A later group with the same name replaces the earlier one.
    pub fn group(mut self, schema: Schema) -> Self {
        let schema = Arc::new(schema);
        match self.index.get(schema.group()) {
            Some(&i) => self.groups[i] = schema,
            None => {
                self.index
                    .insert(schema.group().to_string(), self.groups.len());
                self.groups.push(schema);
            }
        }
        self
    }

    pub fn build(self) -> Arc<RecordType> {
        debug!(
            record_type = %self.name,
            groups = self.groups.len(),
            "built record type"
        );
        Arc::new(RecordType {
            name: self.name,
            groups: self.groups,
            index: self.index,
        })
    }
}

impl RecordType {
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared schema of `group`.
    pub fn schema(&self, group: &str) -> Result<&Arc<Schema>> {
        self.index
            .get(group)
            .map(|&i| &self.groups[i])
            .ok_or_else(|| AttrError::UnknownGroup(group.to_string()))
    }

    /// Schemas in declaration order.
    pub fn schemas(&self) -> &[Arc<Schema>] {
        &self.groups
    }

    /// Every declared field name across groups, in declaration order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|s| s.field_names().map(String::from))
            .collect()
    }

    /// A fresh, unpersisted record.
    pub fn new_record(self: &Arc<Self>) -> Record {
        Record::with_blobs(Uuid::new_v4(), Arc::clone(self), Blobs::new(), true)
    }

    /// Load a persisted record.
    pub fn find<S>(self: &Arc<Self>, store: &S, id: Uuid) -> Result<Record>
    where
        S: RecordStore + ?Sized,
    {
        let blobs = store
            .load_blobs(&id)?
            .ok_or(AttrError::RecordNotFound(id))?;
        Ok(Record::with_blobs(id, Arc::clone(self), blobs, false))
    }
}

#[derive(Debug)]
pub struct Record {
    id: Uuid,
    record_type: Arc<RecordType>,
    new_record: bool,
    blobs: Blobs,
    groups: BTreeMap<String, LazyAttributes>,
}

fn source_for<'a>(blobs: &'a Blobs, schema: &Schema, new_record: bool) -> BlobSource<'a> {
    BlobSource {
        raw: blobs.get(schema.blob_field()).map(String::as_str),
        new_record,
    }
}

impl Record {
    fn with_blobs(id: Uuid, record_type: Arc<RecordType>, blobs: Blobs, new_record: bool) -> Self {
        let groups = record_type
            .schemas()
            .iter()
            .map(|s| (s.group().to_string(), LazyAttributes::new(Arc::clone(s))))
            .collect();
        Self {
            id,
            record_type,
            new_record,
            blobs,
            groups,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    fn container(&self, group: &str) -> Result<(&LazyAttributes, BlobSource<'_>)> {
        let attrs = self
            .groups
            .get(group)
            .ok_or_else(|| AttrError::UnknownGroup(group.to_string()))?;
        let source = source_for(&self.blobs, attrs.schema(), self.new_record);
        Ok((attrs, source))
    }

    fn field(&self, group: &str, field: &str) -> Result<(&LazyAttributes, BlobSource<'_>)> {
        let (attrs, source) = self.container(group)?;
        require_field(attrs.schema(), field)?;
        Ok((attrs, source))
    }

    pub fn read(&self, group: &str, field: &str) -> Result<Value> {
        let (attrs, source) = self.field(group, field)?;
        attrs.get(source, field)
    }

    /// Assign a field, returning the value as parsed by its type.
    pub fn write(&mut self, group: &str, field: &str, value: impl Into<Value>) -> Result<Value> {
        let Record {
            blobs,
            groups,
            new_record,
            ..
        } = self;
        let attrs = groups
            .get_mut(group)
            .ok_or_else(|| AttrError::UnknownGroup(group.to_string()))?;
        require_field(attrs.schema(), field)?;
        let source = source_for(blobs, attrs.schema(), *new_record);
        attrs.write(source, field, value.into())
    }

    /// Boolean alias: the truthiness of a boolean field.
    pub fn is(&self, group: &str, field: &str) -> Result<bool> {
        let (attrs, source) = self.container(group)?;
        if !require_field(attrs.schema(), field)?.is_boolean() {
            return Err(AttrError::NotBoolean {
                field: field.to_string(),
            });
        }
        Ok(attrs.get(source, field)?.is_truthy())
    }

    pub fn is_changed(&self, group: &str, field: &str) -> Result<bool> {
        let (attrs, _) = self.field(group, field)?;
        Ok(attrs.is_changed(field))
    }

    /// `(before, current)` if the field was written since load.
    pub fn change(&self, group: &str, field: &str) -> Result<Option<(Value, Value)>> {
        let (attrs, source) = self.field(group, field)?;
        attrs.change_for(source, field)
    }

    pub fn changed_fields(&self, group: &str) -> Result<Vec<String>> {
        let (attrs, _) = self.container(group)?;
        Ok(attrs.changed_fields())
    }

    pub fn is_group_changed(&self, group: &str) -> Result<bool> {
        let (attrs, _) = self.container(group)?;
        Ok(attrs.any_changed())
    }

    /// The field's current value as it would be written to the blob, as text.
    pub fn before_type_cast(&self, group: &str, field: &str) -> Result<String> {
        let (attrs, source) = self.field(group, field)?;
        let value = attrs.get(source, field)?;
        let encoded = attrs.schema().encode_value(field, value)?;
        Ok(encoded.to_string())
    }

    /// The group's blob as last loaded or prepared for save.
    pub fn raw_blob(&self, group: &str) -> Result<Option<&str>> {
        let schema = self.record_type.schema(group)?;
        Ok(self.blobs.get(schema.blob_field()).map(String::as_str))
    }

    /// Sorted names of the values present in every group, decoding as needed.
    pub fn attribute_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for attrs in self.groups.values() {
            let source = source_for(&self.blobs, attrs.schema(), self.new_record);
            names.extend(attrs.present_names(source)?);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Re-encode every group into its blob.
    pub fn prepare_save(&mut self) -> Result<()> {
        let mut encoded = Vec::with_capacity(self.groups.len());
        for attrs in self.groups.values() {
            let source = source_for(&self.blobs, attrs.schema(), self.new_record);
            encoded.push((attrs.schema().blob_field().to_string(), attrs.encode(source)?));
        }
        self.blobs.extend(encoded);
        Ok(())
    }

    pub fn save<S>(&mut self, store: &S) -> Result<()>
    where
        S: RecordStore + ?Sized,
    {
        self.prepare_save()?;
        store.save_blobs(&self.id, &self.blobs)?;
        self.new_record = false;
        debug!(id = %self.id, record_type = %self.record_type.name(), "saved record");
        Ok(())
    }

    /// Replace the blobs with the stored ones and reset every container.
    pub fn reload<S>(&mut self, store: &S) -> Result<()>
    where
        S: RecordStore + ?Sized,
    {
        let blobs = store
            .load_blobs(&self.id)?
            .ok_or(AttrError::RecordNotFound(self.id))?;
        self.blobs = blobs;
        self.new_record = false;
        for attrs in self.groups.values_mut() {
            attrs.reset();
        }
        debug!(id = %self.id, record_type = %self.record_type.name(), "reloaded record");
        Ok(())
    }

    /// Drop the decoded values and changes of one group.
    pub fn reset_serialized_data(&mut self, group: &str) -> Result<()> {
        let attrs = self
            .groups
            .get_mut(group)
            .ok_or_else(|| AttrError::UnknownGroup(group.to_string()))?;
        attrs.reset();
        trace!(group, "reset serialized data");
        Ok(())
    }
}
