//! The persisted session record: raw token plus serialized identity under
//! two storage keys.

use super::storage::SessionStorage;
use super::UserIdentity;
use crate::config::SessionConfig;
use crate::{AuthError, SecretString};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub token: SecretString,
    pub identity: UserIdentity,
}

/// Reads and writes the record. Only the session manager holds one.
#[derive(Debug)]
pub(crate) struct RecordStore<S> {
    storage: S,
    token_key: String,
    user_key: String,
}

impl<S: SessionStorage> RecordStore<S> {
    pub(crate) fn new(storage: S, config: &SessionConfig) -> Self {
        Self {
            storage,
            token_key: config.token_key.clone(),
            user_key: config.user_key.clone(),
        }
    }

    /// Loads the record.
    ///
    /// `Ok(None)` when no token is stored. A token without a parseable
    /// identity is an error so the caller clears both keys.
    pub(crate) fn load(&self) -> Result<Option<SessionRecord>, AuthError> {
        let Some(token) = self.storage.get(&self.token_key)? else {
            return Ok(None);
        };

        let user = self
            .storage
            .get(&self.user_key)?
            .ok_or_else(|| AuthError::Serialization("stored identity is missing".to_owned()))?;

        let identity: UserIdentity = serde_json::from_str(&user)
            .map_err(|e| AuthError::Serialization(format!("stored identity is corrupt: {e}")))?;

        Ok(Some(SessionRecord {
            token: SecretString::new(token),
            identity,
        }))
    }

    pub(crate) fn save(&self, record: &SessionRecord) -> Result<(), AuthError> {
        let user = serde_json::to_string(&record.identity)
            .map_err(|e| AuthError::Serialization(format!("Failed to serialize identity: {e}")))?;

        self.storage
            .set(&self.token_key, record.token.expose_secret())?;
        if let Err(e) = self.storage.set(&self.user_key, &user) {
            // no half-written record
            let _ = self.storage.remove(&self.token_key);
            return Err(e);
        }
        Ok(())
    }

    /// Removes both keys, attempting the second even if the first fails.
    pub(crate) fn clear(&self) -> Result<(), AuthError> {
        let token = self.storage.remove(&self.token_key);
        let user = self.storage.remove(&self.user_key);
        token.and(user)
    }
}
