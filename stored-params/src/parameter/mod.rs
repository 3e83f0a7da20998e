//! Typed persisted parameters.
//!
//! A [`StoredParameter<T>`] binds a name to one slot in a backend. It holds
//! no cached value: every call is a round-trip to the store, so two
//! parameters with the same name on the same store always agree, and the
//! last writer wins.
//!
//! # Example
//!
//! ```rust
//! use stored_params::preferences::InMemoryPreferences;
//! use stored_params::StoredParameter;
//!
//! let retries: StoredParameter<i64> =
//!     StoredParameter::preferences("retryCount", InMemoryPreferences::new());
//!
//! retries.set(3);
//! assert_eq!(retries.get(), Some(3));
//!
//! retries.assign(None);
//! assert_eq!(retries.get(), None);
//! ```

mod backend;

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub use backend::{
    key_prefix, ParameterStore, PreferencesParameterStore, SecureParameterStore, StoreKind,
};

use crate::preferences::PreferencesStore;
use crate::secure_storage::SecureStorage;
use crate::value::StorableValue;
use crate::Result;

/// Prefix of every parameter's storage key.
pub const KEY_PREFIX: &str = "stored_parameter_";

/// Build the storage key for a parameter name.
pub fn storage_key(name: &str) -> String {
    format!("{}{}", KEY_PREFIX, name)
}

/// A named value of type `T` persisted in a preferences or secure backend.
///
/// The infallible accessors ([`get`](Self::get), [`set`](Self::set),
/// [`remove`](Self::remove), [`assign`](Self::assign)) treat every backend
/// failure as "absent": reads yield `None` and writes are dropped. Use the
/// `try_*` variants when the caller has to know.
pub struct StoredParameter<T: StorableValue> {
    name: String,
    key: String,
    store: Arc<dyn ParameterStore>,
    _value: PhantomData<fn() -> T>,
}

impl<T: StorableValue> StoredParameter<T> {
    /// Bind `name` to a backend.
    ///
    /// No I/O happens here.
    pub fn new(name: impl Into<String>, store: Arc<dyn ParameterStore>) -> Self {
        let name = name.into();
        Self {
            key: storage_key(&name),
            name,
            store,
            _value: PhantomData,
        }
    }

    /// Bind `name` to a preferences store.
    pub fn preferences<P>(name: impl Into<String>, preferences: P) -> Self
    where
        P: PreferencesStore + 'static,
    {
        Self::new(name, Arc::new(PreferencesParameterStore::new(preferences)))
    }

    /// Bind `name` to a secure store, namespaced by the host application's
    /// identifier.
    pub fn secure<S>(name: impl Into<String>, storage: S, app_id: Option<&str>) -> Self
    where
        S: SecureStorage + 'static,
    {
        Self::new(name, Arc::new(SecureParameterStore::new(storage, app_id)))
    }

    /// Get the parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the storage key, `"stored_parameter_{name}"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the backend kind.
    pub fn kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// Read the value.
    ///
    /// `None` if absent, unreadable, or stored as a different type.
    pub fn get(&self) -> Option<T> {
        match self.try_get() {
            Ok(value) => value,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(key = %self.key, store = %self.kind(), error = %_e, "stored parameter read failed");
                None
            }
        }
    }

    /// Write the value. Backend failures are dropped.
    pub fn set(&self, value: T) {
        if let Err(_e) = self.try_set(value) {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %self.key, store = %self.kind(), error = %_e, "stored parameter write dropped");
        }
    }

    /// Remove the value. Backend failures are dropped.
    pub fn remove(&self) {
        if let Err(_e) = self.try_remove() {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %self.key, store = %self.kind(), error = %_e, "stored parameter remove dropped");
        }
    }

    /// Write `Some(value)`, or remove the slot for `None`.
    pub fn assign(&self, value: Option<T>) {
        match value {
            Some(value) => self.set(value),
            None => self.remove(),
        }
    }

    /// Read the value, reporting backend and parse failures.
    ///
    /// A value stored as a different kind in preferences still reads as
    /// `Ok(None)`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(key = %self.key, kind = %T::KIND)))]
    pub fn try_get(&self) -> Result<Option<T>> {
        Ok(self.store.load(&self.key, T::KIND)?.and_then(T::from_stored))
    }

    /// Write the value, reporting backend failures.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, value), fields(key = %self.key, kind = %T::KIND)))]
    pub fn try_set(&self, value: T) -> Result<()> {
        self.store.save(&self.key, value.into_stored())
    }

    /// Remove the value, reporting backend failures.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(key = %self.key)))]
    pub fn try_remove(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    /// Write `Some(value)` or remove for `None`, reporting backend failures.
    pub fn try_assign(&self, value: Option<T>) -> Result<()> {
        match value {
            Some(value) => self.try_set(value),
            None => self.try_remove(),
        }
    }
}

impl<T: StorableValue> Clone for StoredParameter<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            store: Arc::clone(&self.store),
            _value: PhantomData,
        }
    }
}

impl<T: StorableValue> fmt::Debug for StoredParameter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredParameter")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("store", &self.kind())
            .field("kind", &T::KIND)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreErrorCode;
    use crate::preferences::InMemoryPreferences;
    use crate::secure_storage::InMemorySecureStorage;

    #[test]
    fn test_key_derivation() {
        let param: StoredParameter<String> =
            StoredParameter::preferences("token", InMemoryPreferences::new());
        assert_eq!(param.name(), "token");
        assert_eq!(param.key(), "stored_parameter_token");
        assert_eq!(param.kind(), StoreKind::Preferences);
    }

    #[test]
    fn test_secure_token_scenario() {
        let param: StoredParameter<String> =
            StoredParameter::secure("token", InMemorySecureStorage::new(), Some("com.example"));

        param.set("abc123".to_string());
        assert_eq!(param.get().as_deref(), Some("abc123"));

        param.remove();
        assert_eq!(param.get(), None);
    }

    #[test]
    fn test_preferences_retry_scenario() {
        let param: StoredParameter<i64> =
            StoredParameter::preferences("retryCount", InMemoryPreferences::new());

        param.set(3);
        assert_eq!(param.get(), Some(3));
        param.set(5);
        assert_eq!(param.get(), Some(5));
    }

    #[test]
    fn test_assign_none_removes() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let param: StoredParameter<bool> = StoredParameter::preferences("flag", Arc::clone(&prefs));

        param.assign(Some(false));
        assert_eq!(param.get(), Some(false));
        assert!(prefs.contains("stored_parameter_flag").unwrap());

        param.assign(None);
        assert_eq!(param.get(), None);
        assert!(!prefs.contains("stored_parameter_flag").unwrap());
    }

    #[test]
    fn test_locked_vault_degrades_to_absent() {
        let vault = Arc::new(InMemorySecureStorage::new());
        let param: StoredParameter<f64> =
            StoredParameter::secure("ratio", Arc::clone(&vault), Some("app"));

        param.set(0.25);
        vault.lock();

        assert_eq!(param.get(), None);
        param.set(0.5);
        param.remove();
        assert_eq!(param.try_get().unwrap_err().code(), StoreErrorCode::AccessDenied);
        assert!(param.try_set(0.75).is_err());

        vault.unlock();
        assert_eq!(param.get(), Some(0.25));
    }

    #[test]
    fn test_clone_shares_slot() {
        let param: StoredParameter<Vec<u8>> =
            StoredParameter::preferences("blob", InMemoryPreferences::new());
        let copy = param.clone();

        param.set(vec![1, 2, 3]);
        assert_eq!(copy.get(), Some(vec![1, 2, 3]));
        assert!(format!("{:?}", copy).contains("stored_parameter_blob"));
    }
}
