//! Store implementation
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{KvError, Result};

/// Concurrency-safe key/value map
///
/// Constructed once per process and shared by handle (`Arc<Store>` or via
/// the engine) with every request handler and with replay.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<String, String>>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite `key` (write lock)
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Get the current value of `key` (read lock)
    ///
    /// Fails with [`KvError::KeyNotFound`] if the key was never put or has
    /// been deleted.
    pub fn get(&self, key: &str) -> Result<String> {
        self.data.read().get(key).cloned().ok_or(KvError::KeyNotFound)
    }

    /// Remove `key` if present (write lock). Deleting an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.data.write().remove(key);
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of the current contents, for comparisons in tests and tooling
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.data.read().clone()
    }
}
