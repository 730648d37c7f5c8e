//! In-memory session storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::storage::SessionStorage;
use crate::AuthError;

/// Stores entries in a `HashMap` behind a `RwLock`.
///
/// Clones share the same map, so a clone handed to a second
/// [`SessionManager`](super::SessionManager) behaves like the same browser
/// storage seen after a reload.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_owned()))?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_owned()))?
            .insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_owned()))?
            .remove(key);

        Ok(())
    }
}
