//! Parameterized SQL assembly for the generated CRUD shapes.
//!
//! Every function returns a [`BoundStatement`]: SQL text plus parameters in
//! binding order. Identifiers are emitted unquoted; column lists follow the
//! order of the message's set-field enumeration, so the column list and the
//! parameter list stay in lock-step. Runtime values are passed through
//! [`crate::coerce::to_storage`] as they are bound.

use std::collections::HashMap;

use crate::coerce::to_storage;
use crate::core::{MapperError, Result, Value};
use crate::schema::FieldDescriptor;

/// SQL text with its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// `INSERT INTO table(col,..) VALUES(?,..)` over the set fields only.
///
/// Unset fields are omitted from both lists; their columns fall back to the
/// database's own defaults.
pub fn insert(table: &str, fields: &[(&FieldDescriptor, Value)]) -> Result<BoundStatement> {
    if fields.is_empty() {
        return Err(MapperError::EmptyInsert(table.to_string()));
    }
    let mut columns = String::new();
    let mut placeholders = String::new();
    let mut params = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        if !columns.is_empty() {
            columns.push(',');
            placeholders.push(',');
        }
        columns.push_str(field.name());
        placeholders.push('?');
        params.push(to_storage(field, value.clone())?);
    }
    Ok(BoundStatement {
        sql: format!("INSERT INTO {}({}) VALUES({})", table, columns, placeholders),
        params,
    })
}

/// `UPDATE table SET col=?,.. WHERE pk=?` over the set fields.
///
/// The primary-key value is routed into the trailing WHERE clause and bound
/// last. Unset fields are excluded from SET: this is sparse-update behavior,
/// a partially populated message leaves the other columns untouched.
pub fn update(
    table: &str,
    primary_key: &str,
    fields: &[(&FieldDescriptor, Value)],
) -> Result<BoundStatement> {
    let mut set_clause = String::new();
    let mut params = Vec::new();
    let mut key_param = None;
    for (field, value) in fields {
        let stored = to_storage(field, value.clone())?;
        if field.name() == primary_key {
            key_param = Some(stored);
            continue;
        }
        if !set_clause.is_empty() {
            set_clause.push(',');
        }
        set_clause.push_str(field.name());
        set_clause.push_str("=?");
        params.push(stored);
    }
    let key = key_param.ok_or_else(|| {
        MapperError::MissingPrimaryKey(
            table.to_string(),
            format!("primary key field '{}' is not set", primary_key),
        )
    })?;
    if set_clause.is_empty() {
        return Err(MapperError::EmptyInsert(table.to_string()));
    }
    params.push(key);
    Ok(BoundStatement {
        sql: format!("UPDATE {} SET {} WHERE {}=?", table, set_clause, primary_key),
        params,
    })
}

/// `UPDATE table SET col=?,.. WHERE 1=1 AND cond=?..` with caller-supplied
/// conditions.
///
/// Condition names and values must match 1:1; the mismatch check runs before
/// any SQL is assembled. Set fields named as conditions are excluded from
/// SET (the primary key is not special-cased). Condition values are bound as
/// supplied, after the SET parameters.
pub fn update_by_condition(
    table: &str,
    fields: &[(&FieldDescriptor, Value)],
    condition_fields: &[&str],
    condition_values: &[Value],
) -> Result<BoundStatement> {
    if condition_fields.len() != condition_values.len() {
        return Err(MapperError::ArgumentMismatch {
            fields: condition_fields.len(),
            values: condition_values.len(),
        });
    }
    let mut set_clause = String::new();
    let mut params = Vec::new();
    for (field, value) in fields {
        if condition_fields.contains(&field.name()) {
            continue;
        }
        if !set_clause.is_empty() {
            set_clause.push(',');
        }
        set_clause.push_str(field.name());
        set_clause.push_str("=?");
        params.push(to_storage(field, value.clone())?);
    }
    if set_clause.is_empty() {
        return Err(MapperError::EmptyInsert(table.to_string()));
    }
    let mut sql = format!("UPDATE {} SET {} WHERE 1=1", table, set_clause);
    for name in condition_fields {
        sql.push_str(" AND ");
        sql.push_str(name);
        sql.push_str("=?");
    }
    params.extend(condition_values.iter().cloned());
    Ok(BoundStatement { sql, params })
}

/// Staged-vs-current diff for partial updates.
///
/// Both sides must already be in storage representation. A staged field
/// differs when the current row has no value for it or the values are not
/// equal; the primary key never diffs (it becomes the WHERE clause). The
/// returned fields keep staging order.
pub fn changed_fields<'a>(
    staged: &[(&'a FieldDescriptor, Value)],
    current: &HashMap<String, Value>,
    primary_key: &str,
) -> Vec<(&'a FieldDescriptor, Value)> {
    let mut changed = Vec::new();
    for (field, value) in staged {
        if field.name() == primary_key {
            continue;
        }
        if current.get(field.name()) != Some(value) {
            changed.push((*field, value.clone()));
        }
    }
    changed
}

/// Base projection for the mapped table.
pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

/// Key lookup for the mapped table.
pub fn select_by_key(table: &str, primary_key: &str) -> String {
    format!("SELECT * FROM {} WHERE {} = ?", table, primary_key)
}
