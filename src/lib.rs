// ============================================================================
// ProtoSQL Library
// ============================================================================
//
// Maps schema-annotated messages onto relational rows: derive `Message` on a
// plain struct, hand the repository an executor for your database and get
// typed CRUD without writing SQL by hand.

pub mod coerce;
pub mod core;
pub mod executor;
pub mod message;
pub mod repo;
pub mod row;
pub mod schema;
pub mod statement;

#[cfg(test)]
mod fixtures;

// Re-export main types for convenience
pub use core::{EnumValue, MapperError, Result, Value, ValueKind};
pub use repo::Repository;
pub use row::{SqlRow, materialize};
pub use statement::BoundStatement;

// Re-export the mapping API
pub use executor::StatementExecutor;
pub use message::{Enumeration, Message, MessageBuilder};
pub use schema::{
    ColumnKind, FieldDescriptor, MessageDescriptor, SchemaProvider, StaticSchema, TableAnnotation,
};

// Derive macros, sharing the trait names.
pub use protosql_derive::{Enumeration, Message};
