//! In-memory preferences storage.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::{PreferencesError, PreferencesResult, PreferencesStore};
use crate::value::StoredValue;

/// In-memory preferences.
///
/// Values are lost when the process exits.
#[derive(Default)]
pub struct InMemoryPreferences {
    values: RwLock<HashMap<String, StoredValue>>,
}

fn lock_error(context: &str) -> PreferencesError {
    PreferencesError::Other(format!(
        "InMemoryPreferences: lock poisoned during {}",
        context
    ))
}

impl InMemoryPreferences {
    /// Create empty in-memory preferences.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored values.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Check if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferencesStore for InMemoryPreferences {
    fn get(&self, key: &str) -> PreferencesResult<Option<StoredValue>> {
        let values = self.values.read().map_err(|_| lock_error("get"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> PreferencesResult<()> {
        let mut values = self.values.write().map_err(|_| lock_error("set"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PreferencesResult<()> {
        let mut values = self.values.write().map_err(|_| lock_error("remove"))?;
        values.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> PreferencesResult<Vec<String>> {
        let values = self.values.read().map_err(|_| lock_error("list_keys"))?;
        Ok(values.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let prefs = InMemoryPreferences::new();

        prefs.set("volume", StoredValue::Float(0.5)).unwrap();
        assert_eq!(prefs.get("volume").unwrap(), Some(StoredValue::Float(0.5)));
        assert!(prefs.contains("volume").unwrap());

        prefs.remove("volume").unwrap();
        assert_eq!(prefs.get("volume").unwrap(), None);
        assert!(prefs.is_empty());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let prefs = InMemoryPreferences::new();
        prefs.remove("nonexistent").unwrap();
    }

    #[test]
    fn test_overwrite_changes_kind() {
        let prefs = InMemoryPreferences::new();

        prefs.set("k", StoredValue::Integer(1)).unwrap();
        prefs.set("k", StoredValue::Text("one".into())).unwrap();

        assert_eq!(prefs.get("k").unwrap(), Some(StoredValue::Text("one".into())));
        assert_eq!(prefs.len(), 1);
    }
}
