use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::value::Value;

/// Default name of the uid property.
pub const DEFAULT_UID_FIELD: &str = "uid";

/// Unique identifier of a referenceable entity.
///
/// Uid values are compared as strings: an entity whose uid property holds the
/// integer `1` and one holding the string `"1"` are the same entity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(String);

impl Uid {
    /// Wrap an already-normalized uid string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The uid a scalar stands for: a string, an integer, or a finite float.
    /// Integral floats map to the integer form.
    pub fn from_scalar(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Int(i) => Some(Self(i.to_string())),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Some(Self((*f as i64).to_string()))
            }
            Value::Float(f) if f.is_finite() => Some(Self(f.to_string())),
            _ => None,
        }
    }

    /// A fresh, time-ordered uid (UUID v7) for new entities.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// The uid as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for Uid {
    fn from(i: i64) -> Self {
        Self(i.to_string())
    }
}

impl From<i32> for Uid {
    fn from(i: i32) -> Self {
        Self(i.to_string())
    }
}

impl From<&Uid> for Uid {
    fn from(uid: &Uid) -> Self {
        uid.clone()
    }
}

/// The configured uid property and the capability check built on it.
///
/// A value is a referenceable entity only if it is a record whose uid
/// property holds a string or a finite number. Everything else is an
/// embedded value. Integral floats produce the same uid as the integer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidField(String);

impl UidField {
    /// Validate a uid property name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '.') {
            return Err(TypeError::InvalidUidField(name));
        }
        Ok(Self(name))
    }

    /// Name of the uid property.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// The uid carried by `value`, if it is a referenceable entity.
    pub fn uid_of(&self, value: &Value) -> Option<Uid> {
        Uid::from_scalar(value.field(&self.0)?)
    }

    /// Whether `value` carries a usable uid.
    pub fn is_entity(&self, value: &Value) -> bool {
        self.uid_of(value).is_some()
    }
}

impl Default for UidField {
    fn default() -> Self {
        Self(DEFAULT_UID_FIELD.to_string())
    }
}
