//! Typed persisted parameters.
//!
//! This crate maps a named, typed value onto one of two key/value backends:
//! a plain preferences store for simple settings, or a secure credential
//! store for secrets. Backends are injected through traits, so hosts can
//! plug in their platform stores and tests can use in-memory fakes.
//!
//! # Features
//!
//! - **Typed parameters**: [`StoredParameter<T>`] for `String`, `i64`, `i32`,
//!   `f64`, `f32`, `bool` and `Vec<u8>`; other types do not compile
//! - **Two backends**: [`preferences`] and [`secure_storage`], each with an
//!   in-memory and a persistent implementation
//! - **Forgiving access**: reads degrade to `None` and writes are dropped on
//!   backend failure, with `try_*` variants that report errors
//!
//! # Example
//!
//! ```
//! use stored_params::{StoreConfig, StoreKind, StoredParameter};
//!
//! let stores = StoreConfig::new("com.example.app").open().unwrap();
//!
//! let token: StoredParameter<String> = stores.parameter("token", StoreKind::Secure);
//! token.set("abc123".to_string());
//! assert_eq!(token.get().as_deref(), Some("abc123"));
//!
//! token.remove();
//! assert_eq!(token.get(), None);
//! ```

pub mod config;
pub mod errors;
mod file_lock;
pub mod parameter;
pub mod preferences;
pub mod secure_storage;
pub mod value;

pub use config::{PreferencesBackendConfig, SecureBackendConfig, StoreConfig, Stores};
pub use errors::{StoreError, StoreErrorCode};
pub use parameter::{ParameterStore, StoreKind, StoredParameter};
pub use value::{StorableValue, StoredValue, ValueKind};

/// Common result alias for stored parameter operations.
pub type Result<T> = std::result::Result<T, StoreError>;
