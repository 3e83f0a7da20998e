//! OS credential vault storage using the system keyring.
//!
//! Backed by the `keyring` crate:
//!
//! - **macOS / iOS**: Keychain Services
//! - **Windows**: Credential Manager
//! - **Linux**: kernel keyutils

use keyring::Entry;

use super::traits::{
    SecureStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
};

/// Secure storage wrapper for the system keyring.
///
/// Every key becomes one keyring entry under `service`. The keyring cannot
/// enumerate entries, so [`list_keys`](SecureStorage::list_keys) reports
/// `Unsupported`.
pub struct KeyringStorage {
    service: String,
}

fn map_keyring_error(key: &str, err: keyring::Error) -> SecureStorageError {
    match err {
        keyring::Error::NoStorageAccess(e) => SecureStorageError::with_key(
            SecureStorageErrorCode::AccessDenied,
            format!("Keyring access denied: {}", e),
            key,
        ),
        keyring::Error::NoEntry => SecureStorageError::not_found(key),
        keyring::Error::BadEncoding(_) => {
            SecureStorageError::invalid_data(key, "Keyring entry is not valid UTF-8")
        }
        other => SecureStorageError::with_key(
            SecureStorageErrorCode::Platform,
            format!("Keyring error: {}", other),
            key,
        ),
    }
}

impl KeyringStorage {
    /// Create keyring storage for a service name.
    ///
    /// Use the application identifier so entries stay scoped to the app.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Get the service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> SecureStorageResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| map_keyring_error(key, e))
    }
}

impl SecureStorage for KeyringStorage {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, value), fields(service = %self.service)))]
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()> {
        self.entry(key)?
            .set_secret(value)
            .map_err(|e| map_keyring_error(key, e))?;
        #[cfg(feature = "tracing")]
        tracing::debug!("Stored credential for key: {}", key);
        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(service = %self.service)))]
    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        match self.entry(key)?.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(key, e)),
        }
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(service = %self.service)))]
    fn delete(&self, key: &str) -> SecureStorageResult<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Deleted credential for key: {}", key);
                Ok(())
            }
            Err(e) => Err(map_keyring_error(key, e)),
        }
    }

    fn list_keys(&self) -> SecureStorageResult<Vec<String>> {
        Err(SecureStorageError::new(
            SecureStorageErrorCode::Unsupported,
            "Feature not supported: keyring enumeration",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_storage::SecureStorageExt;

    #[test]
    fn test_keyring_roundtrip() {
        let storage = KeyringStorage::new("com.stored-params.test");
        let test_key = "test_stored_params_key";

        // Clean up any existing entry
        let _ = storage.delete(test_key);

        if let Err(err) = storage.store_string(test_key, "test_secret_value") {
            eprintln!("Skipping keyring round-trip, no usable keyring: {}", err);
            return;
        }

        let retrieved = storage.retrieve_string(test_key).expect("Failed to get");
        assert_eq!(retrieved.as_deref(), Some("test_secret_value"));

        storage.delete(test_key).expect("Failed to delete");
        assert_eq!(storage.retrieve(test_key).expect("Failed to get"), None);

        // Deleting twice is not an error
        storage.delete(test_key).expect("Failed to delete");
    }

    #[test]
    fn test_list_keys_unsupported() {
        let storage = KeyringStorage::new("com.stored-params.test");
        let err = storage.list_keys().unwrap_err();
        assert_eq!(err.code, SecureStorageErrorCode::Unsupported);
    }
}
