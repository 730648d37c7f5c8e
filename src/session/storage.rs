//! Durable key-value storage for the persisted session record.

use std::sync::Arc;

use crate::AuthError;

/// Client-side key-value storage that survives a reload.
///
/// The operations are synchronous: logout has to complete without awaiting
/// anything, offline included.
///
/// Implementations provide different backends:
/// - [`InMemorySessionStorage`](super::InMemorySessionStorage): process-local, for tests and embedding
/// - [`FileSessionStorage`](super::FileSessionStorage): one file per key in a directory
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        (**self).remove(key)
    }
}
