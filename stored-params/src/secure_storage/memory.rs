//! In-memory secure storage implementation.
//!
//! This implementation is for testing and development only.
//!
//! # Thread Safety
//!
//! This storage uses `RwLock` for thread-safe access. Lock poisoning
//! is handled gracefully by returning an error rather than panicking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::traits::{
    SecureStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
};

/// In-memory implementation of secure storage.
///
/// **Warning**: Values are not encrypted and are lost when the process
/// exits. [`lock`](Self::lock) makes every operation fail with
/// `StorageLocked`, the way a device vault behaves before first unlock.
#[derive(Default)]
pub struct InMemorySecureStorage {
    values: RwLock<HashMap<String, Vec<u8>>>,
    locked: AtomicBool,
}

fn lock_error(context: &str) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Internal,
        format!("InMemorySecureStorage: lock poisoned during {}", context),
    )
}

impl InMemorySecureStorage {
    /// Create a new in-memory secure storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny all access until [`unlock`](Self::unlock) is called.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    /// Restore access.
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    /// Check if access is currently denied.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Get the number of stored values.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Check if storage is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_unlocked(&self) -> SecureStorageResult<()> {
        if self.is_locked() {
            Err(SecureStorageError::locked())
        } else {
            Ok(())
        }
    }
}

impl SecureStorage for InMemorySecureStorage {
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()> {
        self.ensure_unlocked()?;
        let mut values = self.values.write().map_err(|_| lock_error("store"))?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        self.ensure_unlocked()?;
        let values = self.values.read().map_err(|_| lock_error("retrieve"))?;
        Ok(values.get(key).cloned())
    }

    fn delete(&self, key: &str) -> SecureStorageResult<()> {
        self.ensure_unlocked()?;
        let mut values = self.values.write().map_err(|_| lock_error("delete"))?;
        values.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> SecureStorageResult<Vec<String>> {
        self.ensure_unlocked()?;
        let values = self.values.read().map_err(|_| lock_error("list_keys"))?;
        Ok(values.keys().cloned().collect())
    }
}
