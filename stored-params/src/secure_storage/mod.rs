//! Secure credential storage backend.
//!
//! This module provides a platform-agnostic trait for credential storage,
//! with implementations for:
//! - In-memory storage (for testing)
//! - The OS keyring (feature `os-keyring`)
//! - A password-protected vault file (feature `file-storage`)
//!
//! ## Usage
//!
//! ```rust
//! use stored_params::secure_storage::{InMemorySecureStorage, SecureStorage, SecureStorageExt};
//!
//! let storage = InMemorySecureStorage::new();
//! storage.store_string("api-token", "abc123").unwrap();
//! assert_eq!(storage.retrieve_string("api-token").unwrap().as_deref(), Some("abc123"));
//! storage.delete("api-token").unwrap();
//! ```
//!
//! ## Security Considerations
//!
//! - Values are never logged
//! - Use [`PrefixedStorage`] to keep applications apart in a shared vault

mod memory;
mod prefixed;
mod traits;

#[cfg(feature = "os-keyring")]
mod os_keyring;

#[cfg(feature = "file-storage")]
mod encrypted_file;

pub use memory::InMemorySecureStorage;
pub use prefixed::PrefixedStorage;
pub use traits::{
    SecureStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageExt,
    SecureStorageResult,
};

#[cfg(feature = "os-keyring")]
pub use os_keyring::KeyringStorage;

#[cfg(feature = "file-storage")]
pub use encrypted_file::EncryptedFileStorage;
