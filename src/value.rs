//! Values held by device and stage data stores.
//!
//! Stores map string keys (`monitor.waitTime`, `modem.signal`, ...) to a small
//! set of typed values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Possible values a data store entry can hold.
///
/// # Examples
///
/// ```
/// use modempoll::Value;
///
/// let flag = Value::Bool(true);
/// let words = Value::Registers(vec![0x0102, 0x0304]);
///
/// assert_eq!(flag.as_bool(), Some(true));
/// assert_eq!(words.as_registers(), Some(&[0x0102, 0x0304][..]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// UTC timestamp.
    Time(DateTime<Utc>),
    /// Free text.
    Text(String),
    /// Raw register block.
    Registers(Vec<u16>),
    /// Explicitly cleared value.
    Null,
}

impl Value {
    /// Whether this is `Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The timestamp, if this is one.
    pub const fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// The register block, if this is one.
    pub fn as_registers(&self) -> Option<&[u16]> {
        match self {
            Self::Registers(v) => Some(v),
            _ => None,
        }
    }

    /// Returns a human-readable type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Time(_) => "time",
            Self::Text(_) => "text",
            Self::Registers(_) => "registers",
            Self::Null => "null",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<u16>> for Value {
    fn from(v: Vec<u16>) -> Self {
        Self::Registers(v)
    }
}
