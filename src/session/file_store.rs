//! File-based session storage.
//!
//! Each key is stored as a file named after the key in the configured
//! directory, so the session survives a process restart.

use std::io::ErrorKind;
use std::path::PathBuf;

use super::storage::SessionStorage;
use crate::AuthError;

/// File-based session storage.
///
/// # Example
///
/// ```rust,ignore
/// use frontdesk::session::FileSessionStorage;
///
/// let storage = FileSessionStorage::new("/var/lib/frontdesk/session")?;
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    directory: PathBuf,
}

impl FileSessionStorage {
    /// Creates the directory if it doesn't exist.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let dir = directory.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AuthError::StorageError(format!("Failed to create storage directory: {e}"))
        })?;
        Ok(Self { directory: dir })
    }

    /// Returns `None` for keys that could escape the directory.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        safe.then(|| self.directory.join(key))
    }

    fn require_path(&self, key: &str) -> Result<PathBuf, AuthError> {
        self.entry_path(key)
            .ok_or_else(|| AuthError::StorageError(format!("Invalid storage key: {key:?}")))
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let Some(path) = self.entry_path(key) else {
            return Ok(None);
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::StorageError(format!(
                "Failed to read storage file: {e}"
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.require_path(key)?;

        std::fs::write(&path, value)
            .map_err(|e| AuthError::StorageError(format!("Failed to write storage file: {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        let path = self.require_path(key)?;

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::StorageError(format!(
                "Failed to remove storage file: {e}"
            ))),
        }
    }
}
