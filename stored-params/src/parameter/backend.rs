//! Backends a stored parameter can be bound to.
//!
//! [`ParameterStore`] is the seam between a typed parameter and the raw
//! stores: the preferences adapter passes values through unchanged, the
//! secure adapter marshals them into the strings and bytes a credential vault
//! understands.

use std::fmt;

use crate::errors::StoreError;
use crate::preferences::PreferencesStore;
use crate::secure_storage::{PrefixedStorage, SecureStorage, SecureStorageExt};
use crate::value::{StoredValue, ValueKind};
use crate::Result;

/// Which kind of backend a parameter is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// Plain preferences.
    Preferences,
    /// Secure credential store.
    Secure,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preferences => f.write_str("preferences"),
            Self::Secure => f.write_str("secure"),
        }
    }
}

/// Object-safe backend interface used by `StoredParameter`.
pub trait ParameterStore: Send + Sync {
    /// Get the backend kind.
    fn kind(&self) -> StoreKind;

    /// Load the value at `key`, interpreting it as `kind` where the backend
    /// needs to know the expected shape.
    fn load(&self, key: &str, kind: ValueKind) -> Result<Option<StoredValue>>;

    /// Persist `value` at `key`.
    fn save(&self, key: &str, value: StoredValue) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores values in their native form in a [`PreferencesStore`].
pub struct PreferencesParameterStore<P: PreferencesStore> {
    preferences: P,
}

impl<P: PreferencesStore> PreferencesParameterStore<P> {
    /// Wrap a preferences store.
    pub fn new(preferences: P) -> Self {
        Self { preferences }
    }

    /// Get the wrapped preferences store.
    pub fn preferences(&self) -> &P {
        &self.preferences
    }
}

impl<P: PreferencesStore> ParameterStore for PreferencesParameterStore<P> {
    fn kind(&self) -> StoreKind {
        StoreKind::Preferences
    }

    fn load(&self, key: &str, _kind: ValueKind) -> Result<Option<StoredValue>> {
        Ok(self.preferences.get(key)?)
    }

    fn save(&self, key: &str, value: StoredValue) -> Result<()> {
        Ok(self.preferences.set(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(self.preferences.remove(key)?)
    }
}

/// Marshals values into a [`SecureStorage`] vault under an application
/// namespace.
///
/// | kind | stored as |
/// |------|-----------|
/// | text | UTF-8 string |
/// | integer, double, float | shortest round-trip decimal string |
/// | bool | `"true"` / `"false"` |
/// | bytes | raw bytes |
pub struct SecureParameterStore<S: SecureStorage> {
    storage: PrefixedStorage<S>,
}

impl<S: SecureStorage> SecureParameterStore<S> {
    /// Wrap a secure storage, namespacing keys by `app_id`.
    ///
    /// The namespace prefix is `"{app_id}_keychain_"`; a missing `app_id`
    /// yields `"_keychain_"`.
    pub fn new(storage: S, app_id: Option<&str>) -> Self {
        Self {
            storage: PrefixedStorage::new(storage, key_prefix(app_id)),
        }
    }

    /// Get the namespace prefix.
    pub fn key_prefix(&self) -> &str {
        self.storage.prefix()
    }

    /// Get the wrapped secure storage.
    pub fn storage(&self) -> &S {
        self.storage.inner()
    }

    fn load_parsed<N: std::str::FromStr>(&self, key: &str, kind: ValueKind) -> Result<Option<N>> {
        match self.storage.retrieve_string(key)? {
            Some(s) => s
                .parse::<N>()
                .map(Some)
                .map_err(|_| StoreError::parse(self.storage.prefixed_key(key), kind)),
            None => Ok(None),
        }
    }
}

/// Build the secure-store namespace prefix for an application identifier.
pub fn key_prefix(app_id: Option<&str>) -> String {
    format!("{}_keychain_", app_id.unwrap_or_default())
}

impl<S: SecureStorage> ParameterStore for SecureParameterStore<S> {
    fn kind(&self) -> StoreKind {
        StoreKind::Secure
    }

    fn load(&self, key: &str, kind: ValueKind) -> Result<Option<StoredValue>> {
        let value = match kind {
            ValueKind::Text => self.storage.retrieve_string(key)?.map(StoredValue::Text),
            ValueKind::Integer => self.load_parsed(key, kind)?.map(StoredValue::Integer),
            ValueKind::Double => self.load_parsed(key, kind)?.map(StoredValue::Double),
            ValueKind::Float => self.load_parsed(key, kind)?.map(StoredValue::Float),
            ValueKind::Bool => self.storage.retrieve_bool(key)?.map(StoredValue::Bool),
            ValueKind::Bytes => self.storage.retrieve(key)?.map(StoredValue::Bytes),
        };
        Ok(value)
    }

    fn save(&self, key: &str, value: StoredValue) -> Result<()> {
        // Display for floats is the shortest string that parses back exactly.
        match value {
            StoredValue::Text(s) => self.storage.store_string(key, &s)?,
            StoredValue::Integer(n) => self.storage.store_string(key, &n.to_string())?,
            StoredValue::Double(n) => self.storage.store_string(key, &n.to_string())?,
            StoredValue::Float(n) => self.storage.store_string(key, &n.to_string())?,
            StoredValue::Bool(b) => self.storage.store_bool(key, b)?,
            StoredValue::Bytes(b) => self.storage.store(key, &b)?,
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        Ok(self.storage.delete(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreErrorCode;
    use crate::preferences::InMemoryPreferences;
    use crate::secure_storage::InMemorySecureStorage;

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix(Some("com.example.app")), "com.example.app_keychain_");
        assert_eq!(key_prefix(None), "_keychain_");
    }

    #[test]
    fn test_secure_marshalling_layout() {
        let store = SecureParameterStore::new(InMemorySecureStorage::new(), Some("app"));

        store.save("n", StoredValue::Integer(-42)).unwrap();
        store.save("d", StoredValue::Double(0.1)).unwrap();
        store.save("f", StoredValue::Float(1.5)).unwrap();
        store.save("b", StoredValue::Bool(false)).unwrap();
        store.save("raw", StoredValue::Bytes(vec![9, 8])).unwrap();

        let raw = store.storage();
        assert_eq!(raw.retrieve_string("app_keychain_n").unwrap().unwrap(), "-42");
        assert_eq!(raw.retrieve_string("app_keychain_d").unwrap().unwrap(), "0.1");
        assert_eq!(raw.retrieve_string("app_keychain_f").unwrap().unwrap(), "1.5");
        assert_eq!(raw.retrieve_string("app_keychain_b").unwrap().unwrap(), "false");
        assert_eq!(raw.retrieve("app_keychain_raw").unwrap().unwrap(), vec![9, 8]);
    }

    #[test]
    fn test_secure_parse_failure() {
        let store = SecureParameterStore::new(InMemorySecureStorage::new(), Some("app"));
        store.save("n", StoredValue::Text("twelve".into())).unwrap();

        let err = store.load("n", ValueKind::Integer).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Parse);
        assert!(err.to_string().contains("app_keychain_n"));

        // The same slot still reads fine as text.
        assert_eq!(
            store.load("n", ValueKind::Text).unwrap(),
            Some(StoredValue::Text("twelve".into()))
        );
    }

    #[test]
    fn test_secure_integer_width_mismatch() {
        let store = SecureParameterStore::new(InMemorySecureStorage::new(), None);
        store.save("x", StoredValue::Double(2.5)).unwrap();

        assert!(store.load("x", ValueKind::Integer).is_err());
        assert_eq!(
            store.load("x", ValueKind::Float).unwrap(),
            Some(StoredValue::Float(2.5))
        );
    }

    #[test]
    fn test_preferences_passthrough() {
        let store = PreferencesParameterStore::new(InMemoryPreferences::new());
        store.save("k", StoredValue::Integer(7)).unwrap();

        // Preferences ignore the requested kind; casting happens later.
        assert_eq!(
            store.load("k", ValueKind::Text).unwrap(),
            Some(StoredValue::Integer(7))
        );
        assert_eq!(store.kind(), StoreKind::Preferences);
    }
}
