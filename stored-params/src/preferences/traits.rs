//! Core trait for preferences storage.

use crate::value::StoredValue;

/// Error type for preferences operations.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("Preferences I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Preferences error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for PreferencesError {
    fn from(e: serde_json::Error) -> Self {
        PreferencesError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for PreferencesError {
    fn from(e: std::io::Error) -> Self {
        PreferencesError::Io(e.to_string())
    }
}

/// Result type for preferences operations.
pub type PreferencesResult<T> = std::result::Result<T, PreferencesError>;

/// Process-wide preferences store keyed by string.
///
/// Implementations must be thread-safe. Last writer wins; no versioning.
pub trait PreferencesStore: Send + Sync {
    /// Get the raw value stored under `key`.
    fn get(&self, key: &str) -> PreferencesResult<Option<StoredValue>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: StoredValue) -> PreferencesResult<()>;

    /// Remove `key`.
    ///
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> PreferencesResult<()>;

    /// List all stored keys.
    fn list_keys(&self) -> PreferencesResult<Vec<String>>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> PreferencesResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<P: PreferencesStore + ?Sized> PreferencesStore for std::sync::Arc<P> {
    fn get(&self, key: &str) -> PreferencesResult<Option<StoredValue>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: StoredValue) -> PreferencesResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> PreferencesResult<()> {
        (**self).remove(key)
    }

    fn list_keys(&self) -> PreferencesResult<Vec<String>> {
        (**self).list_keys()
    }
}
