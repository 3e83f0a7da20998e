//! Key namespacing for shared credential stores.

use super::traits::{SecureStorage, SecureStorageResult};

/// Storage wrapper that adds a prefix to all keys.
///
/// Several applications sharing one vault stay apart by using distinct
/// prefixes. The prefix is prepended verbatim, so include any separator in
/// it (for example `"com.example.app_keychain_"`).
pub struct PrefixedStorage<S: SecureStorage> {
    inner: S,
    prefix: String,
}

impl<S: SecureStorage> PrefixedStorage<S> {
    /// Create a new prefixed storage.
    pub fn new(inner: S, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    /// Get the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the wrapped storage.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Build the key as stored in the wrapped storage.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl<S: SecureStorage> SecureStorage for PrefixedStorage<S> {
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()> {
        self.inner.store(&self.prefixed_key(key), value)
    }

    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        self.inner.retrieve(&self.prefixed_key(key))
    }

    fn delete(&self, key: &str) -> SecureStorageResult<()> {
        self.inner.delete(&self.prefixed_key(key))
    }

    fn list_keys(&self) -> SecureStorageResult<Vec<String>> {
        let all_keys = self.inner.list_keys()?;
        Ok(all_keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(String::from))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::secure_storage::InMemorySecureStorage;

    #[test]
    fn test_prefix_isolation() {
        let shared = Arc::new(InMemorySecureStorage::new());
        let app_a = PrefixedStorage::new(Arc::clone(&shared), "com.a_keychain_");
        let app_b = PrefixedStorage::new(Arc::clone(&shared), "com.b_keychain_");

        app_a.store("token", b"a").unwrap();
        app_b.store("token", b"b").unwrap();

        assert_eq!(app_a.retrieve("token").unwrap(), Some(b"a".to_vec()));
        assert_eq!(app_b.retrieve("token").unwrap(), Some(b"b".to_vec()));
        assert_eq!(
            shared.retrieve("com.a_keychain_token").unwrap(),
            Some(b"a".to_vec())
        );

        assert_eq!(app_a.list_keys().unwrap(), vec!["token".to_string()]);

        app_a.clear().unwrap();
        assert_eq!(app_a.retrieve("token").unwrap(), None);
        assert_eq!(app_b.retrieve("token").unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn test_empty_prefix_is_passthrough() {
        let storage = PrefixedStorage::new(InMemorySecureStorage::new(), "");
        storage.store("k", b"v").unwrap();
        assert_eq!(storage.inner().retrieve("k").unwrap(), Some(b"v".to_vec()));
    }
}
