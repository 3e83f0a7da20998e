//! JSON file-backed preferences.
//!
//! All entries live in a single JSON document. Every operation re-reads the
//! file, so stores opened on the same path observe each other's writes.
//! Writers lock a sidecar file for the whole read-modify-write cycle and
//! replace the document by rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::traits::{PreferencesError, PreferencesResult, PreferencesStore};
use crate::file_lock::{self, FileLock};
use crate::value::StoredValue;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PreferencesFile {
    version: u32,
    #[serde(default)]
    values: BTreeMap<String, StoredValue>,
}

impl Default for PreferencesFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            values: BTreeMap::new(),
        }
    }
}

/// Preferences persisted to a JSON file.
///
/// Any number of instances, in any number of processes, may share a path.
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    /// Open preferences stored at `path`.
    ///
    /// The file is created lazily on the first write. Parent directories
    /// are created as needed.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> PreferencesResult<PreferencesFile> {
        if !self.path.exists() {
            return Ok(PreferencesFile::default());
        }

        let json = std::fs::read_to_string(&self.path)?;
        let file: PreferencesFile = serde_json::from_str(&json)?;
        if file.version != FORMAT_VERSION {
            return Err(PreferencesError::Other(format!(
                "unsupported preferences file version {}",
                file.version
            )));
        }
        Ok(file)
    }

    fn save(&self, file: &PreferencesFile) -> PreferencesResult<()> {
        let json = serde_json::to_string_pretty(file)?;
        file_lock::write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }

    fn modify<F>(&self, f: F) -> PreferencesResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, StoredValue>) -> bool,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut file = self.load()?;
        if f(&mut file.values) {
            self.save(&file)?;
        }
        Ok(())
    }
}

impl PreferencesStore for JsonFilePreferences {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(path = %self.path.display())))]
    fn get(&self, key: &str) -> PreferencesResult<Option<StoredValue>> {
        Ok(self.load()?.values.remove(key))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, value), fields(path = %self.path.display(), kind = %value.kind())))]
    fn set(&self, key: &str, value: StoredValue) -> PreferencesResult<()> {
        self.modify(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(path = %self.path.display())))]
    fn remove(&self, key: &str) -> PreferencesResult<()> {
        // Absent keys leave the file untouched.
        self.modify(|values| values.remove(key).is_some())
    }

    fn list_keys(&self) -> PreferencesResult<Vec<String>> {
        Ok(self.load()?.values.into_keys().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));

        assert_eq!(prefs.get("anything").unwrap(), None);
        assert!(prefs.list_keys().unwrap().is_empty());
        prefs.remove("anything").unwrap();
        assert!(!prefs.path().exists());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let prefs = JsonFilePreferences::new(&path);
        prefs.set("name", StoredValue::Text("alice".into())).unwrap();
        prefs.set("blob", StoredValue::Bytes(vec![0, 255])).unwrap();
        drop(prefs);

        let reopened = JsonFilePreferences::new(&path);
        assert_eq!(
            reopened.get("name").unwrap(),
            Some(StoredValue::Text("alice".into()))
        );
        assert_eq!(
            reopened.get("blob").unwrap(),
            Some(StoredValue::Bytes(vec![0, 255]))
        );

        let mut keys = reopened.list_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["blob", "name"]);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert!(matches!(
            prefs.get("k"),
            Err(PreferencesError::Serialization(_))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"version":99,"values":{}}"#).unwrap();

        let prefs = JsonFilePreferences::new(&path);
        assert!(matches!(prefs.get("k"), Err(PreferencesError::Other(_))));
    }

    #[test]
    fn test_concurrent_instances_keep_every_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let prefs = JsonFilePreferences::new(&path);
                    for i in 0..25 {
                        prefs
                            .set(&format!("w{}_{}", writer, i), StoredValue::Integer(i))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let prefs = JsonFilePreferences::new(&path);
        assert_eq!(prefs.list_keys().unwrap().len(), 100);
        assert_eq!(prefs.get("w3_24").unwrap(), Some(StoredValue::Integer(24)));
    }

    #[test]
    fn test_non_finite_floats_do_not_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let prefs = JsonFilePreferences::new(&path);

        prefs.set("name", StoredValue::Text("alice".into())).unwrap();
        prefs.set("inf", StoredValue::Double(f64::INFINITY)).unwrap();
        prefs.set("ninf", StoredValue::Float(f32::NEG_INFINITY)).unwrap();
        prefs.set("nan", StoredValue::Double(f64::NAN)).unwrap();

        let reopened = JsonFilePreferences::new(&path);
        assert_eq!(
            reopened.get("name").unwrap(),
            Some(StoredValue::Text("alice".into()))
        );
        assert_eq!(
            reopened.get("inf").unwrap(),
            Some(StoredValue::Double(f64::INFINITY))
        );
        assert_eq!(
            reopened.get("ninf").unwrap(),
            Some(StoredValue::Float(f32::NEG_INFINITY))
        );
        assert!(matches!(
            reopened.get("nan").unwrap(),
            Some(StoredValue::Double(n)) if n.is_nan()
        ));
    }

    #[test]
    fn test_doubles_survive_file_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));

        for n in [-9.875_712_648_546_688e26, 0.1 + 0.2, f64::MIN_POSITIVE, 5e-324] {
            prefs.set("d", StoredValue::Double(n)).unwrap();
            match prefs.get("d").unwrap() {
                Some(StoredValue::Double(back)) => assert_eq!(back.to_bits(), n.to_bits()),
                other => panic!("unexpected value {:?}", other),
            }
        }
    }
}
