//! Schema provider capability: where the facade reads annotations from.
//!
//! The default provider reads the derive-generated static descriptor. A
//! different provider can be injected when annotations come from somewhere
//! else (late-bound configuration, tests). The facade consults
//! `table_annotation()` exactly once and memoizes whatever it returns.

use std::marker::PhantomData;

use crate::message::Message;
use crate::schema::{FieldDescriptor, TableAnnotation};

pub trait SchemaProvider: Send + Sync {
    /// Field descriptors in declaration order.
    fn fields(&self) -> &[FieldDescriptor];

    /// Current table-level annotation. Called once per facade instance; the
    /// answer is cached permanently, blank or not.
    fn table_annotation(&self) -> TableAnnotation;
}

/// Provider backed by `M::descriptor()`.
pub struct StaticSchema<M: Message> {
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> StaticSchema<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M: Message> Default for StaticSchema<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> SchemaProvider for StaticSchema<M> {
    fn fields(&self) -> &[FieldDescriptor] {
        M::descriptor().fields()
    }

    fn table_annotation(&self) -> TableAnnotation {
        M::descriptor().annotation().clone()
    }
}
