//! # Value Type System
//!
//! Core attribute values: Int64, Float64, Str, Bool. Values carry a total
//! order and a hash (floats compare and hash by their bit pattern) so that
//! tuples can key the hash sets and maps the operators deduplicate with.
//!
//! ## Usage
//!
//! ```rust
//! use relstream::{DataType, Value};
//!
//! let qty = Value::Int64(200);
//! assert_eq!(qty.data_type(), DataType::Int64);
//! assert_eq!(DataType::Str.zero(), Value::Str(String::new()));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Declared type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Float64,
    Str,
    Bool,
}

impl DataType {
    /// The fill value for attributes a producer does not populate.
    pub fn zero(&self) -> Value {
        match self {
            DataType::Int64 => Value::Int64(0),
            DataType::Float64 => Value::Float64(0.0),
            DataType::Str => Value::Str(String::new()),
            DataType::Bool => Value::Bool(false),
        }
    }

    /// Whether a value of type `other` can fill an attribute of this type.
    ///
    /// Assignability is strict type equality; the engine performs no
    /// implicit numeric coercion.
    pub fn assignable_from(&self, other: &DataType) -> bool {
        self == other
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int64 => write!(f, "int"),
            DataType::Float64 => write!(f, "float"),
            DataType::Str => write!(f, "string"),
            DataType::Bool => write!(f, "bool"),
        }
    }
}

/// One attribute value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int64(i64),
    Float64(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    /// The declared type this value conforms to
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Str(_) => DataType::Str,
            Value::Bool(_) => DataType::Bool,
        }
    }

    fn variant_rank(&self) -> u8 {
        match self {
            Value::Int64(_) => 0,
            Value::Float64(_) => 1,
            Value::Str(_) => 2,
            Value::Bool(_) => 3,
        }
    }
}

// Floats take part in hashing and set membership, so equality is defined
// on the bit pattern. NaN equals NaN here; the engine never produces NaN
// itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant_rank().hash(state);
        match self {
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => {
                a.partial_cmp(b).unwrap_or_else(|| a.to_bits().cmp(&b.to_bits()))
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "\"{}\"", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
