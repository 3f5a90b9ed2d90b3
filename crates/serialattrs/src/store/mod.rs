//! # Record storage
//!
//! Records persist as one row of raw blobs, keyed by blob field name
//! (`raw_data`, `raw_settings`, ...). The [`RecordStore`] trait handles the
//! "how" of keeping those rows; [`Record`](crate::record::Record) handles the
//! "what" (which blobs exist, when they are re-encoded).
//!
//! [`MemStore`] is the in-memory implementation used by tests and examples.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::error::Result;

mod memory;

pub use memory::MemStore;

/// Raw blobs of one record, by blob field name.
pub type Blobs = BTreeMap<String, String>;

/// Abstract interface for persisting record blobs.
pub trait RecordStore {
    /// Load the blobs of a record.
    /// Returns Ok(None) if no record with this id was ever saved.
    fn load_blobs(&self, id: &Uuid) -> Result<Option<Blobs>>;

    /// Replace the blobs of a record, creating it if needed.
    fn save_blobs(&self, id: &Uuid, blobs: &Blobs) -> Result<()>;

    /// Remove a record. Removing a missing record is not an error.
    fn delete(&self, id: &Uuid) -> Result<()>;

    /// Ids of every stored record.
    fn ids(&self) -> Result<Vec<Uuid>>;
}
