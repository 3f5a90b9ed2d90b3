use super::{Blobs, RecordStore};
use crate::error::{AttrError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory record store for testing.
///
/// Uses `RefCell` for interior mutability so that `RecordStore` can take
/// `&self` everywhere. Not `Sync`; share it within one thread.
#[derive(Default)]
pub struct MemStore {
    rows: RefCell<HashMap<Uuid, Blobs>>,
    simulate_write_error: RefCell<bool>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Test helper to overwrite one blob of a stored record, as another
    /// writer would. Returns true if the record existed.
    pub fn put_blob(&self, id: &Uuid, field: &str, raw: &str) -> bool {
        let mut rows = self.rows.borrow_mut();
        if let Some(row) = rows.get_mut(id) {
            row.insert(field.to_string(), raw.to_string());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }
}

impl RecordStore for MemStore {
    fn load_blobs(&self, id: &Uuid) -> Result<Option<Blobs>> {
        let rows = self.rows.borrow();
        Ok(rows.get(id).cloned())
    }

    fn save_blobs(&self, id: &Uuid, blobs: &Blobs) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(AttrError::Store("Simulated write error".to_string()));
        }
        let mut rows = self.rows.borrow_mut();
        rows.insert(*id, blobs.clone());
        Ok(())
    }

    fn delete(&self, id: &Uuid) -> Result<()> {
        let mut rows = self.rows.borrow_mut();
        rows.remove(id);
        Ok(())
    }

    fn ids(&self) -> Result<Vec<Uuid>> {
        let rows = self.rows.borrow();
        let mut ids: Vec<Uuid> = rows.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs(raw: &str) -> Blobs {
        let mut blobs = Blobs::new();
        blobs.insert("raw_data".to_string(), raw.to_string());
        blobs
    }

    #[test]
    fn test_save_and_load() {
        let store = MemStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.load_blobs(&id).unwrap(), None);

        store.save_blobs(&id, &blobs("{}")).unwrap();
        assert_eq!(store.load_blobs(&id).unwrap(), Some(blobs("{}")));
        assert_eq!(store.ids().unwrap(), vec![id]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_replaces_row() {
        let store = MemStore::new();
        let id = Uuid::new_v4();
        store.save_blobs(&id, &blobs("{}")).unwrap();
        store.save_blobs(&id, &blobs(r#"{"a":1}"#)).unwrap();
        assert_eq!(store.load_blobs(&id).unwrap(), Some(blobs(r#"{"a":1}"#)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemStore::new();
        let id = Uuid::new_v4();
        store.save_blobs(&id, &blobs("{}")).unwrap();
        store.delete(&id).unwrap();
        store.delete(&id).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_simulated_write_error() {
        let store = MemStore::new();
        store.set_simulate_write_error(true);
        let err = store.save_blobs(&Uuid::new_v4(), &blobs("{}")).unwrap_err();
        assert!(matches!(err, AttrError::Store(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_blob_requires_existing_row() {
        let store = MemStore::new();
        let id = Uuid::new_v4();
        assert!(!store.put_blob(&id, "raw_data", "{}"));
        store.save_blobs(&id, &blobs("{}")).unwrap();
        assert!(store.put_blob(&id, "raw_data", r#"{"a":2}"#));
        assert_eq!(store.load_blobs(&id).unwrap(), Some(blobs(r#"{"a":2}"#)));
    }
}
