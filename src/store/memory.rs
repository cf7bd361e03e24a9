//! In-memory record store.
//!
//! Backs tests and the demo binary. A single mutex around an ordered map
//! plays the role the database's unique constraints play in production: the
//! lock makes `insert_if_absent` a genuinely atomic check-and-write.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::record::{RecordStore, StoreError};

/// Process-local `RecordStore` over an ordered map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held (for tests and monitoring).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still coherent for string inserts.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut records = self.lock();
        if records.contains_key(key) {
            return Ok(false);
        }
        records.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    fn upsert(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let records = self.lock();
        Ok(records
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
