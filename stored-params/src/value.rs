//! The closed set of value types a stored parameter can hold.
//!
//! Both backends understand exactly these kinds. [`StorableValue`] is sealed,
//! so a `StoredParameter<T>` for any other `T` fails to compile instead of
//! silently dropping writes at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value in its backend-neutral representation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StoredValue {
    /// UTF-8 text.
    Text(String),
    /// Signed 64-bit integer.
    Integer(i64),
    /// Double precision float.
    #[serde(with = "decimal_float")]
    Double(f64),
    /// Single precision float.
    #[serde(with = "decimal_float")]
    Float(f32),
    /// Boolean flag.
    Bool(bool),
    /// Raw byte buffer.
    #[serde(with = "hex_bytes")]
    Bytes(Vec<u8>),
}

impl StoredValue {
    /// Get the kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Double(_) => ValueKind::Double,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Bytes(_) => ValueKind::Bytes,
        }
    }
}

/// Kind tag of a [`StoredValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Integer,
    Double,
    Float,
    Bool,
    Bytes,
}

impl ValueKind {
    /// Get the kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for i64 {}
    impl Sealed for i32 {}
    impl Sealed for f64 {}
    impl Sealed for f32 {}
    impl Sealed for bool {}
    impl Sealed for Vec<u8> {}
}

/// A Rust type that can be persisted by a stored parameter.
///
/// Implemented for `String`, `i64`, `i32`, `f64`, `f32`, `bool` and
/// `Vec<u8>`. The trait is sealed.
pub trait StorableValue: sealed::Sealed + Sized {
    /// Kind this type is stored as.
    const KIND: ValueKind;

    /// Convert into the backend-neutral representation.
    fn into_stored(self) -> StoredValue;

    /// Cast back from the backend-neutral representation.
    ///
    /// Returns `None` when the stored kind does not match.
    fn from_stored(value: StoredValue) -> Option<Self>;
}

impl StorableValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn into_stored(self) -> StoredValue {
        StoredValue::Text(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl StorableValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn into_stored(self) -> StoredValue {
        StoredValue::Integer(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(n) => Some(n),
            _ => None,
        }
    }
}

impl StorableValue for i32 {
    const KIND: ValueKind = ValueKind::Integer;

    fn into_stored(self) -> StoredValue {
        StoredValue::Integer(i64::from(self))
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(n) => i32::try_from(n).ok(),
            _ => None,
        }
    }
}

impl StorableValue for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn into_stored(self) -> StoredValue {
        StoredValue::Double(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Double(n) => Some(n),
            _ => None,
        }
    }
}

impl StorableValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_stored(self) -> StoredValue {
        StoredValue::Float(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Float(n) => Some(n),
            _ => None,
        }
    }
}

impl StorableValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_stored(self) -> StoredValue {
        StoredValue::Bool(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl StorableValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn into_stored(self) -> StoredValue {
        StoredValue::Bytes(self)
    }

    fn from_stored(value: StoredValue) -> Option<Self> {
        match value {
            StoredValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Hex encoding for byte buffers in JSON documents.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Floats in JSON documents as their shortest round-trip decimal string.
///
/// JSON numbers cannot carry infinities or NaN, and parsing them back is not
/// guaranteed bit-exact; `Display`/`FromStr` are.
pub(crate) mod decimal_float {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: Display, S: Serializer>(n: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(n)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
