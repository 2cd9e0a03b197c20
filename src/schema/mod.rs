//! Message and field descriptors: the static schema a message type exposes.
//!
//! Descriptors are built once at type-definition time (normally by
//! `#[derive(Message)]`) and never change. The table-level annotation keeps
//! both attributes optional; operations that need a table name resolve it on
//! demand and fail with `MapperError::SchemaResolution` when it is absent.

pub mod provider;

pub use provider::{SchemaProvider, StaticSchema};

use serde::{Deserialize, Serialize};

use crate::core::{EnumValue, Value, ValueKind};

/// Declared storage category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Plain,
    DateTime,
    Timestamp,
    Enum,
}

impl ColumnKind {
    /// DateTime and Timestamp share the epoch-millisecond storage rule.
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::Timestamp)
    }
}

/// Declarative table-level annotation. Both attributes are optional at the
/// annotation level; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAnnotation {
    pub table_name: Option<String>,
    pub primary_key: Option<String>,
}

impl TableAnnotation {
    pub fn new(table_name: Option<String>, primary_key: Option<String>) -> Self {
        Self {
            table_name,
            primary_key,
        }
    }

    pub fn resolved_table(&self) -> Option<&str> {
        match self.table_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(name),
            _ => None,
        }
    }

    pub fn resolved_primary_key(&self) -> Option<&str> {
        match self.primary_key.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(name),
            _ => None,
        }
    }
}

/// One mapped field. The name maps 1:1 to a column label, exactly and
/// case-sensitively. The default value fixes the runtime type coercion
/// targets; enum fields additionally carry their code-to-symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    kind: ColumnKind,
    default_value: Value,
    enum_values: Vec<EnumValue>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: ColumnKind, default_value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value,
            enum_values: Vec::new(),
        }
    }

    pub fn with_enum_values(mut self, values: Vec<EnumValue>) -> Self {
        self.enum_values = values;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// The runtime type this field coerces to, inferred from its default.
    pub fn runtime_kind(&self) -> ValueKind {
        self.default_value.kind()
    }

    pub fn enum_values(&self) -> &[EnumValue] {
        &self.enum_values
    }

    pub fn enum_value_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.enum_values.iter().find(|v| v.number == number)
    }
}

/// Immutable description of a message type: its name, its table annotation
/// and its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDescriptor {
    name: String,
    annotation: TableAnnotation,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: TableAnnotation::default(),
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.annotation.table_name = Some(table_name.into());
        self
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.annotation.primary_key = Some(primary_key.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &TableAnnotation {
        &self.annotation
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Exact, case-sensitive lookup by column label.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
