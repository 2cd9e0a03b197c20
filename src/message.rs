//! Capability traits implemented by mapped message types.
//!
//! `#[derive(Message)]` (and `#[derive(Enumeration)]` for enum fields)
//! generates all of these; hand-written implementations are possible but the
//! derive is the supported registration path.

use crate::core::{EnumValue, Result, Value};
use crate::schema::{FieldDescriptor, MessageDescriptor};

/// A schema-described message that maps onto one table row.
pub trait Message: Sized + Send + Sync {
    type Builder: MessageBuilder<Message = Self>;

    /// Static descriptor for this type, built on first access and permanent.
    fn descriptor() -> &'static MessageDescriptor;

    /// Fresh builder with every field unset.
    fn new_builder() -> Self::Builder;

    /// The explicitly set fields, in declaration order, with their runtime
    /// values. Unset fields are absent, not null.
    fn set_fields(&self) -> Vec<(&'static FieldDescriptor, Value)>;
}

/// Incremental construction of a message, one field at a time.
pub trait MessageBuilder {
    type Message: Message;

    /// Sets a field from a value already coerced to the field's runtime
    /// type. A value of the wrong variant fails with
    /// `MapperError::TypeCoercion`; a descriptor naming no field of the
    /// target type is ignored.
    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()>;

    fn build(self) -> Self::Message;
}

/// A closed set of named integer codes, the runtime shape of an enum field.
pub trait Enumeration: Sized {
    fn number(&self) -> i32;

    fn name(&self) -> &'static str;

    /// Symbolic value for a storage code, `None` when the code is unknown.
    fn from_number(number: i32) -> Option<Self>;

    /// All declared values, in declaration order.
    fn values() -> Vec<EnumValue>;
}
