//! Core traits for secure credential storage.

use std::fmt;

/// Error codes for secure storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SecureStorageErrorCode {
    /// Key not found
    NotFound = 1000,
    /// Access denied (auth required)
    AccessDenied = 2000,
    /// Storage is locked
    StorageLocked = 2003,
    /// Stored data is malformed for the requested shape
    InvalidData = 4000,
    /// Encryption failed
    EncryptionFailed = 5000,
    /// Decryption failed
    DecryptionFailed = 5001,
    /// Platform not supported
    Unsupported = 6000,
    /// Platform credential store reported an error
    Platform = 7000,
    /// Internal error
    Internal = 9999,
}

/// Error type for secure storage operations.
#[derive(Debug)]
pub struct SecureStorageError {
    /// Error code for FFI/mobile integration
    pub code: SecureStorageErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Key identifier related to error (if applicable)
    pub key_id: Option<String>,
}

impl SecureStorageError {
    /// Create a new error.
    pub fn new(code: SecureStorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            key_id: None,
        }
    }

    /// Create a new error with associated key ID.
    pub fn with_key(
        code: SecureStorageErrorCode,
        message: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            key_id: Some(key_id.into()),
        }
    }

    /// Create a "not found" error.
    pub fn not_found(key_id: impl Into<String>) -> Self {
        let key_id = key_id.into();
        Self {
            code: SecureStorageErrorCode::NotFound,
            message: format!("Key not found: {}", key_id),
            key_id: Some(key_id),
        }
    }

    /// Create a "storage locked" error.
    pub fn locked() -> Self {
        Self::new(SecureStorageErrorCode::StorageLocked, "Secure storage is locked")
    }

    /// Create an "invalid data" error for a key.
    pub fn invalid_data(key_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_key(SecureStorageErrorCode::InvalidData, reason, key_id)
    }

    /// Check if this error requires user authentication.
    pub fn requires_auth(&self) -> bool {
        matches!(
            self.code,
            SecureStorageErrorCode::AccessDenied | SecureStorageErrorCode::StorageLocked
        )
    }
}

impl fmt::Display for SecureStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(key_id) = &self.key_id {
            write!(f, "{} (key: {})", self.message, key_id)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SecureStorageError {}

/// Result type for secure storage operations.
pub type SecureStorageResult<T> = Result<T, SecureStorageError>;

/// Platform-agnostic secure storage trait.
///
/// The store keeps raw bytes; text and flags are layered on top by
/// [`SecureStorageExt`]. Implementations must be thread-safe and should
/// never log stored values.
pub trait SecureStorage: Send + Sync {
    /// Store a value, replacing any previous value for `key`.
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()>;

    /// Retrieve a value, or `None` if not found.
    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>>;

    /// Delete a value.
    ///
    /// Returns an error only on platform errors (not if key doesn't exist).
    fn delete(&self, key: &str) -> SecureStorageResult<()>;

    /// List all keys in storage.
    fn list_keys(&self) -> SecureStorageResult<Vec<String>>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> SecureStorageResult<bool> {
        Ok(self.retrieve(key)?.is_some())
    }

    /// Clear all stored values.
    fn clear(&self) -> SecureStorageResult<()> {
        for key in self.list_keys()? {
            self.delete(&key)?;
        }
        Ok(())
    }
}

const TRUE_TOKEN: &str = "true";
const FALSE_TOKEN: &str = "false";

/// Convenience functions for storing text and flags.
pub trait SecureStorageExt: SecureStorage {
    /// Store a string.
    fn store_string(&self, key: &str, value: &str) -> SecureStorageResult<()> {
        self.store(key, value.as_bytes())
    }

    /// Retrieve a string.
    fn retrieve_string(&self, key: &str) -> SecureStorageResult<Option<String>> {
        match self.retrieve(key)? {
            Some(bytes) => {
                let string = String::from_utf8(bytes)
                    .map_err(|e| SecureStorageError::invalid_data(key, e.to_string()))?;
                Ok(Some(string))
            }
            None => Ok(None),
        }
    }

    /// Store a boolean as a `"true"`/`"false"` token.
    fn store_bool(&self, key: &str, value: bool) -> SecureStorageResult<()> {
        self.store_string(key, if value { TRUE_TOKEN } else { FALSE_TOKEN })
    }

    /// Retrieve a boolean token.
    fn retrieve_bool(&self, key: &str) -> SecureStorageResult<Option<bool>> {
        match self.retrieve_string(key)?.as_deref() {
            Some(TRUE_TOKEN) => Ok(Some(true)),
            Some(FALSE_TOKEN) => Ok(Some(false)),
            Some(other) => Err(SecureStorageError::invalid_data(
                key,
                format!("not a boolean token: {:?}", other),
            )),
            None => Ok(None),
        }
    }
}

impl<T: SecureStorage + ?Sized> SecureStorageExt for T {}

impl<S: SecureStorage + ?Sized> SecureStorage for std::sync::Arc<S> {
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()> {
        (**self).store(key, value)
    }

    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        (**self).retrieve(key)
    }

    fn delete(&self, key: &str) -> SecureStorageResult<()> {
        (**self).delete(key)
    }

    fn list_keys(&self) -> SecureStorageResult<Vec<String>> {
        (**self).list_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SecureStorageError::not_found("my-key");
        assert_eq!(err.code, SecureStorageErrorCode::NotFound);
        assert!(!err.requires_auth());
        assert_eq!(err.key_id, Some("my-key".to_string()));
        assert_eq!(err.to_string(), "Key not found: my-key (key: my-key)");
    }

    #[test]
    fn test_locked_requires_auth() {
        assert!(SecureStorageError::locked().requires_auth());
        assert!(SecureStorageError::new(SecureStorageErrorCode::AccessDenied, "no passcode")
            .requires_auth());
        assert!(!SecureStorageError::invalid_data("k", "bad").requires_auth());
    }
}
