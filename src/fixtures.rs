//! Hand-implemented message fixture for unit tests.
//!
//! Mirrors what `#[derive(Message)]` generates for a three-column message
//! with a text primary key.

use std::sync::LazyLock;

use crate::core::{MapperError, Result, Value};
use crate::message::{Message, MessageBuilder};
use crate::schema::{ColumnKind, FieldDescriptor, MessageDescriptor};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TestFoo {
    pub col1: Option<String>,
    pub col2: Option<i32>,
    pub col3: Option<f64>,
}

static FOO_DESCRIPTOR: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new("TestFoo")
        .table("foo")
        .primary_key("col1")
        .field(FieldDescriptor::new(
            "col1",
            ColumnKind::Plain,
            Value::Text(String::new()),
        ))
        .field(FieldDescriptor::new(
            "col2",
            ColumnKind::Plain,
            Value::Integer(0),
        ))
        .field(FieldDescriptor::new(
            "col3",
            ColumnKind::Plain,
            Value::Double(0.0),
        ))
});

impl Message for TestFoo {
    type Builder = TestFooBuilder;

    fn descriptor() -> &'static MessageDescriptor {
        &FOO_DESCRIPTOR
    }

    fn new_builder() -> TestFooBuilder {
        TestFooBuilder {
            message: TestFoo::default(),
        }
    }

    fn set_fields(&self) -> Vec<(&'static FieldDescriptor, Value)> {
        let descriptor = Self::descriptor();
        let mut fields = Vec::new();
        if let Some(v) = &self.col1 {
            fields.push((&descriptor.fields()[0], Value::Text(v.clone())));
        }
        if let Some(v) = &self.col2 {
            fields.push((&descriptor.fields()[1], Value::Integer(*v)));
        }
        if let Some(v) = &self.col3 {
            fields.push((&descriptor.fields()[2], Value::Double(*v)));
        }
        fields
    }
}

pub(crate) struct TestFooBuilder {
    message: TestFoo,
}

impl MessageBuilder for TestFooBuilder {
    type Message = TestFoo;

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.name() {
            "col1" => match value {
                Value::Text(v) => self.message.col1 = Some(v),
                other => return Err(wrong_variant(field, &other, "TEXT")),
            },
            "col2" => match value {
                Value::Integer(v) => self.message.col2 = Some(v),
                other => return Err(wrong_variant(field, &other, "INTEGER")),
            },
            "col3" => match value {
                Value::Double(v) => self.message.col3 = Some(v),
                other => return Err(wrong_variant(field, &other, "DOUBLE")),
            },
            _ => {}
        }
        Ok(())
    }

    fn build(self) -> TestFoo {
        self.message
    }
}

fn wrong_variant(field: &FieldDescriptor, found: &Value, target: &str) -> MapperError {
    MapperError::TypeCoercion {
        field: field.name().to_string(),
        from: found.type_name().to_string(),
        target: target.to_string(),
    }
}
