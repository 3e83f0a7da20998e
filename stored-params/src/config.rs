//! Configuration for opening the preferences and secure backends.
//!
//! ```json
//! {
//!   "app_id": "com.example.app",
//!   "preferences": { "backend": "file", "path": "/var/lib/app/prefs.json" },
//!   "secure": { "backend": "keyring" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::parameter::{
    ParameterStore, PreferencesParameterStore, SecureParameterStore, StoreKind, StoredParameter,
};
use crate::preferences::{InMemoryPreferences, JsonFilePreferences, PreferencesStore};
use crate::secure_storage::{InMemorySecureStorage, SecureStorage};
use crate::value::StorableValue;
use crate::Result;

/// Preferences backend selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum PreferencesBackendConfig {
    /// In-memory, lost on exit.
    #[default]
    Memory,
    /// JSON file at `path`.
    File {
        /// Preferences file path.
        path: PathBuf,
    },
}

/// Secure backend selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum SecureBackendConfig {
    /// In-memory, for tests only.
    #[default]
    Memory,
    /// OS keyring; the service name is the app id.
    Keyring,
    /// Password-protected vault file.
    EncryptedFile {
        /// Vault file path.
        path: PathBuf,
        /// Environment variable holding the vault password.
        #[serde(default = "default_password_env")]
        password_env: String,
    },
}

fn default_password_env() -> String {
    "STORED_PARAMS_VAULT_PASSWORD".to_string()
}

/// Configuration for both parameter backends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Host application identifier; namespaces secure-store keys.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Preferences backend.
    #[serde(default)]
    pub preferences: PreferencesBackendConfig,

    /// Secure backend.
    #[serde(default)]
    pub secure: SecureBackendConfig,
}

impl StoreConfig {
    /// Create an in-memory configuration for an application.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            ..Self::default()
        }
    }

    /// Use file-backed preferences.
    pub fn with_preferences_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences = PreferencesBackendConfig::File { path: path.into() };
        self
    }

    /// Use the given secure backend.
    pub fn with_secure(mut self, secure: SecureBackendConfig) -> Self {
        self.secure = secure;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Open the configured backends.
    ///
    /// # Errors
    ///
    /// - `Config` if the keyring is selected without an `app_id`, if a
    ///   backend is not compiled in, or if the vault password is missing
    /// - `SecureStorage` if the vault cannot be opened
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(app_id = ?self.app_id)))]
    pub fn open(&self) -> Result<Stores> {
        let preferences: Arc<dyn PreferencesStore> = match &self.preferences {
            PreferencesBackendConfig::Memory => Arc::new(InMemoryPreferences::new()),
            PreferencesBackendConfig::File { path } => Arc::new(JsonFilePreferences::new(path)),
        };

        let secure: Arc<dyn SecureStorage> = match &self.secure {
            SecureBackendConfig::Memory => Arc::new(InMemorySecureStorage::new()),
            SecureBackendConfig::Keyring => self.open_keyring()?,
            SecureBackendConfig::EncryptedFile { path, password_env } => {
                open_encrypted_file(path, password_env)?
            }
        };

        Ok(Stores {
            app_id: self.app_id.clone(),
            preferences,
            secure,
        })
    }

    #[cfg(feature = "os-keyring")]
    fn open_keyring(&self) -> Result<Arc<dyn SecureStorage>> {
        let service = self
            .app_id
            .as_deref()
            .ok_or_else(|| StoreError::config("keyring backend requires app_id"))?;
        Ok(Arc::new(crate::secure_storage::KeyringStorage::new(service)))
    }

    #[cfg(not(feature = "os-keyring"))]
    fn open_keyring(&self) -> Result<Arc<dyn SecureStorage>> {
        Err(StoreError::config(
            "keyring backend requires the `os-keyring` feature",
        ))
    }
}

#[cfg(feature = "file-storage")]
fn open_encrypted_file(path: &Path, password_env: &str) -> Result<Arc<dyn SecureStorage>> {
    let password = std::env::var(password_env)
        .map_err(|_| StoreError::config(format!("vault password not set in ${}", password_env)))?;
    Ok(Arc::new(crate::secure_storage::EncryptedFileStorage::open(
        path, &password,
    )?))
}

#[cfg(not(feature = "file-storage"))]
fn open_encrypted_file(_path: &Path, _password_env: &str) -> Result<Arc<dyn SecureStorage>> {
    Err(StoreError::config(
        "encrypted_file backend requires the `file-storage` feature",
    ))
}

/// Opened backends, ready to hand out parameters.
#[derive(Clone)]
pub struct Stores {
    app_id: Option<String>,
    preferences: Arc<dyn PreferencesStore>,
    secure: Arc<dyn SecureStorage>,
}

impl Stores {
    /// Assemble stores from already-open backends.
    pub fn new(
        app_id: Option<String>,
        preferences: Arc<dyn PreferencesStore>,
        secure: Arc<dyn SecureStorage>,
    ) -> Self {
        Self {
            app_id,
            preferences,
            secure,
        }
    }

    /// Get the application identifier.
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Get the preferences backend.
    pub fn preferences(&self) -> &Arc<dyn PreferencesStore> {
        &self.preferences
    }

    /// Get the secure backend.
    pub fn secure(&self) -> &Arc<dyn SecureStorage> {
        &self.secure
    }

    /// Build the parameter-level adapter for a backend.
    pub fn parameter_store(&self, kind: StoreKind) -> Arc<dyn ParameterStore> {
        match kind {
            StoreKind::Preferences => Arc::new(PreferencesParameterStore::new(Arc::clone(
                &self.preferences,
            ))),
            StoreKind::Secure => Arc::new(SecureParameterStore::new(
                Arc::clone(&self.secure),
                self.app_id.as_deref(),
            )),
        }
    }

    /// Bind a named parameter to one of the backends.
    pub fn parameter<T: StorableValue>(
        &self,
        name: impl Into<String>,
        kind: StoreKind,
    ) -> StoredParameter<T> {
        StoredParameter::new(name, self.parameter_store(kind))
    }
}
