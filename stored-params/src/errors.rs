//! Error types for stored parameter operations.
//!
//! The infallible parameter API swallows every error listed here; the
//! `try_*` variants surface them for callers that need to verify writes.

use crate::preferences::PreferencesError;
use crate::secure_storage::SecureStorageError;
use crate::value::ValueKind;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum StoreErrorCode {
    /// Preferences backend failure
    Preferences = 1000,
    /// Secure storage failure
    SecureStorage = 2000,
    /// Secure storage denied access (locked, auth required)
    AccessDenied = 2001,
    /// Stored value could not be parsed into the requested type
    Parse = 3000,
    /// Invalid configuration
    Config = 4000,
    /// Filesystem error
    Io = 5000,
    /// Serialization error
    Serialization = 5001,
}

/// Error type for stored parameter operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The preferences backend failed.
    #[error("preferences: {0}")]
    Preferences(#[from] PreferencesError),

    /// The secure storage backend failed.
    #[error("secure storage: {0}")]
    SecureStorage(#[from] SecureStorageError),

    /// The stored representation does not parse as the requested kind.
    #[error("value at '{key}' is not a valid {kind}")]
    Parse {
        /// Full backend key
        key: String,
        /// Requested kind
        kind: ValueKind,
    },

    /// Configuration is invalid or incomplete.
    #[error("config: {0}")]
    Config(String),

    /// Filesystem error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Get the error code for this error.
    pub fn code(&self) -> StoreErrorCode {
        match self {
            Self::Preferences(_) => StoreErrorCode::Preferences,
            Self::SecureStorage(e) if e.requires_auth() => StoreErrorCode::AccessDenied,
            Self::SecureStorage(_) => StoreErrorCode::SecureStorage,
            Self::Parse { .. } => StoreErrorCode::Parse,
            Self::Config(_) => StoreErrorCode::Config,
            Self::Io(_) => StoreErrorCode::Io,
            Self::Serialization(_) => StoreErrorCode::Serialization,
        }
    }

    /// Create a parse error.
    pub fn parse(key: impl Into<String>, kind: ValueKind) -> Self {
        Self::Parse {
            key: key.into(),
            kind,
        }
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_storage::SecureStorageErrorCode;

    #[test]
    fn test_error_codes() {
        let err = StoreError::parse("stored_parameter_x", ValueKind::Integer);
        assert_eq!(err.code(), StoreErrorCode::Parse);
        assert_eq!(err.code() as i32, 3000);

        let locked: StoreError =
            SecureStorageError::new(SecureStorageErrorCode::StorageLocked, "locked").into();
        assert_eq!(locked.code(), StoreErrorCode::AccessDenied);

        let internal: StoreError =
            SecureStorageError::new(SecureStorageErrorCode::Internal, "boom").into();
        assert_eq!(internal.code(), StoreErrorCode::SecureStorage);
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::parse("stored_parameter_count", ValueKind::Double);
        assert_eq!(
            err.to_string(),
            "value at 'stored_parameter_count' is not a valid double"
        );
    }
}
