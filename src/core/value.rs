use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One symbolic value of an enumeration field: its declared name and its
/// storage code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

impl EnumValue {
    pub fn new(name: impl Into<String>, number: i32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

/// A column value, either in the message's runtime representation or coerced
/// for parameter binding. `Null` means "no value supplied".
///
/// `Enum` carries the symbolic value; executors bind it as its integer code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Enum(EnumValue),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Integer(_) => ValueKind::Integer,
            Self::Long(_) => ValueKind::Long,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Text(_) => ValueKind::Text,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Enum(_) => ValueKind::Enum,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(i64::from(*i)),
            Self::Long(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Strict per-variant equality. No cross-width numeric coercion: partial
/// update diffs rely on "same variant, same bits" so that a value read back
/// and restaged compares equal, and nothing else does.
///
/// Floats compare by bit pattern (reflexive, NaN-stable); enums compare by
/// code, since the name is display metadata.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a.number == b.number,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Long(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Double(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Enum(e) => write!(f, "{}", e.name),
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Long(i)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Self::Enum(e)
    }
}

/// The runtime type a coercion targets, inferred from a field's default
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Integer,
    Long,
    Float,
    Double,
    Text,
    Boolean,
    Timestamp,
    Enum,
}

impl ValueKind {
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Enum => "ENUM",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_equality_is_strict_per_variant() {
        assert_eq!(Value::Integer(42), Value::Integer(42));
        assert_ne!(Value::Integer(42), Value::Long(42));
        assert_ne!(Value::Float(1.0), Value::Double(1.0));
        assert_ne!(Value::Integer(1), Value::Integer(2));
        assert_ne!(Value::Long(0), Value::Null);
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Double(3.25), Value::Double(3.25));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn test_enum_equality_by_code() {
        let a = Value::Enum(EnumValue::new("ACTIVE", 1));
        let b = Value::Enum(EnumValue::new("ENABLED", 1));
        let c = Value::Enum(EnumValue::new("ACTIVE", 2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_timestamp_equality_by_instant() {
        let a = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let b = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(Value::Timestamp(a), Value::Timestamp(b));
    }

    #[test]
    fn test_from_impls_pick_the_declared_width() {
        assert_eq!(Value::from(7i32).kind(), ValueKind::Integer);
        assert_eq!(Value::from(7i64).kind(), ValueKind::Long);
        assert_eq!(Value::from(1.5f32).kind(), ValueKind::Float);
        assert_eq!(Value::from(1.5f64).kind(), ValueKind::Double);
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(true).kind(), ValueKind::Boolean);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Long(1700).to_string(), "1700");
        assert_eq!(Value::Text("lxp1".into()).to_string(), "lxp1");
        assert_eq!(
            Value::Enum(EnumValue::new("DISABLED", 0)).to_string(),
            "DISABLED"
        );
    }
}
