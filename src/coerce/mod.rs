//! Value coercion between runtime and storage representations.
//!
//! The rule set is closed and keyed by the field's declared column kind:
//!
//! * DateTime/Timestamp fields store a positive epoch-millisecond integer as
//!   a `Timestamp`; zero and negative values pass through unchanged (written
//!   as literal integers, never as null or a timestamp).
//! * Enum fields travel as symbolic values and materialize by integer code;
//!   an unknown code leaves the field unset instead of failing.
//! * Plain fields coerce to the runtime type inferred from the field's
//!   default value: numeric widening always, integer narrowing only when
//!   lossless, float narrowing by IEEE conversion, string parsing for
//!   numeric and boolean targets, scalar stringification for text targets,
//!   0/1 for booleans. Every other combination is a `TypeCoercion` error,
//!   never a silent conversion.

use chrono::{TimeZone, Utc};

use crate::core::{MapperError, Result, Value, ValueKind};
use crate::schema::{ColumnKind, FieldDescriptor};

/// Coerces a runtime field value into its storage representation.
///
/// Only temporal fields are rewritten, and only for positive integers; any
/// other value passes through unchanged.
pub fn to_storage(field: &FieldDescriptor, value: Value) -> Result<Value> {
    if !field.kind().is_temporal() {
        return Ok(value);
    }
    let millis = match value {
        Value::Integer(n) if n > 0 => i64::from(n),
        Value::Long(n) if n > 0 => n,
        other => return Ok(other),
    };
    match Utc.timestamp_millis_opt(millis).single() {
        Some(instant) => Ok(Value::Timestamp(instant)),
        None => Err(mismatch(field, ValueKind::Long, ValueKind::Timestamp)),
    }
}

/// Coerces a raw column value into the field's runtime representation.
///
/// `Ok(None)` means "leave the field unset": the raw value was null, or an
/// enum code with no declared symbol. Everything else either converts or
/// fails fast.
pub fn to_runtime(field: &FieldDescriptor, raw: &Value) -> Result<Option<Value>> {
    if raw.is_null() {
        return Ok(None);
    }
    if field.kind() == ColumnKind::Enum {
        return enum_to_runtime(field, raw);
    }
    if field.kind().is_temporal() {
        let millis = match raw {
            Value::Timestamp(instant) => instant.timestamp_millis(),
            Value::Long(n) => *n,
            Value::Integer(n) => i64::from(*n),
            _ => return Err(mismatch(field, raw.kind(), ValueKind::Timestamp)),
        };
        return Ok(Some(Value::Long(millis)));
    }
    plain_to_runtime(field, raw).map(Some)
}

fn enum_to_runtime(field: &FieldDescriptor, raw: &Value) -> Result<Option<Value>> {
    let code = match raw {
        Value::Integer(n) => *n,
        Value::Long(n) => i32::try_from(*n)
            .map_err(|_| mismatch(field, ValueKind::Long, ValueKind::Enum))?,
        _ => return Err(mismatch(field, raw.kind(), ValueKind::Enum)),
    };
    Ok(field
        .enum_value_by_number(code)
        .cloned()
        .map(Value::Enum))
}

fn plain_to_runtime(field: &FieldDescriptor, raw: &Value) -> Result<Value> {
    let target = field.runtime_kind();
    match (target, raw) {
        (ValueKind::Integer, Value::Integer(n)) => Ok(Value::Integer(*n)),
        (ValueKind::Integer, Value::Long(n)) => i32::try_from(*n)
            .map(Value::Integer)
            .map_err(|_| mismatch(field, ValueKind::Long, target)),
        (ValueKind::Integer, Value::Text(s)) => s
            .parse::<i32>()
            .map(Value::Integer)
            .map_err(|_| mismatch(field, ValueKind::Text, target)),

        (ValueKind::Long, Value::Long(n)) => Ok(Value::Long(*n)),
        (ValueKind::Long, Value::Integer(n)) => Ok(Value::Long(i64::from(*n))),
        (ValueKind::Long, Value::Text(s)) => s
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|_| mismatch(field, ValueKind::Text, target)),

        (ValueKind::Float, Value::Float(f)) => Ok(Value::Float(*f)),
        (ValueKind::Float, Value::Double(f)) => Ok(Value::Float(*f as f32)),
        (ValueKind::Float, Value::Integer(n)) => Ok(Value::Float(*n as f32)),
        (ValueKind::Float, Value::Long(n)) => Ok(Value::Float(*n as f32)),
        (ValueKind::Float, Value::Text(s)) => s
            .parse::<f32>()
            .map(Value::Float)
            .map_err(|_| mismatch(field, ValueKind::Text, target)),

        (ValueKind::Double, Value::Double(f)) => Ok(Value::Double(*f)),
        (ValueKind::Double, Value::Float(f)) => Ok(Value::Double(f64::from(*f))),
        (ValueKind::Double, Value::Integer(n)) => Ok(Value::Double(f64::from(*n))),
        (ValueKind::Double, Value::Long(n)) => Ok(Value::Double(*n as f64)),
        (ValueKind::Double, Value::Text(s)) => s
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| mismatch(field, ValueKind::Text, target)),

        (ValueKind::Text, Value::Text(s)) => Ok(Value::Text(s.clone())),
        (ValueKind::Text, Value::Integer(n)) => Ok(Value::Text(n.to_string())),
        (ValueKind::Text, Value::Long(n)) => Ok(Value::Text(n.to_string())),
        (ValueKind::Text, Value::Float(f)) => Ok(Value::Text(f.to_string())),
        (ValueKind::Text, Value::Double(f)) => Ok(Value::Text(f.to_string())),
        (ValueKind::Text, Value::Boolean(b)) => Ok(Value::Text(b.to_string())),

        (ValueKind::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(*b)),
        (ValueKind::Boolean, Value::Integer(0)) => Ok(Value::Boolean(false)),
        (ValueKind::Boolean, Value::Integer(1)) => Ok(Value::Boolean(true)),
        (ValueKind::Boolean, Value::Long(0)) => Ok(Value::Boolean(false)),
        (ValueKind::Boolean, Value::Long(1)) => Ok(Value::Boolean(true)),
        (ValueKind::Boolean, Value::Text(s)) => {
            if s.eq_ignore_ascii_case("true") || s == "1" {
                Ok(Value::Boolean(true))
            } else if s.eq_ignore_ascii_case("false") || s == "0" {
                Ok(Value::Boolean(false))
            } else {
                Err(mismatch(field, ValueKind::Text, target))
            }
        }

        _ => Err(mismatch(field, raw.kind(), target)),
    }
}

fn mismatch(field: &FieldDescriptor, from: ValueKind, target: ValueKind) -> MapperError {
    MapperError::TypeCoercion {
        field: field.name().to_string(),
        from: from.type_name().to_string(),
        target: target.type_name().to_string(),
    }
}
