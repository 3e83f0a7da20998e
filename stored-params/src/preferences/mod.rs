//! Plain preferences backend.
//!
//! Unprotected, application-scoped key/value storage for simple settings.
//! Values keep their native [`StoredValue`](crate::value::StoredValue) shape.
//!
//! - [`InMemoryPreferences`] for tests and short-lived processes
//! - [`JsonFilePreferences`] for settings that survive restarts

mod file;
mod memory;
mod traits;

pub use file::JsonFilePreferences;
pub use memory::InMemoryPreferences;
pub use traits::{PreferencesError, PreferencesResult, PreferencesStore};
