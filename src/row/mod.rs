//! Result rows and message materialization.
//!
//! A [`SqlRow`] is the executor-facing shape of one result row: column
//! labels plus raw values in matching positions. [`materialize`] walks a row
//! exactly once and populates a message builder, skipping null values and
//! columns with no matching field descriptor.

use crate::coerce::to_runtime;
use crate::core::{Result, Value};
use crate::message::{Message, MessageBuilder};
use crate::schema::FieldDescriptor;

/// One result row: column labels and raw values, position-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlRow {
    labels: Vec<String>,
    values: Vec<Value>,
}

impl SqlRow {
    /// Builds a row from aligned labels and values; executors must supply
    /// one value per label.
    pub fn new(labels: Vec<String>, values: Vec<Value>) -> Self {
        Self { labels, values }
    }

    pub fn from_pairs(pairs: Vec<(&str, Value)>) -> Self {
        let mut labels = Vec::with_capacity(pairs.len());
        let mut values = Vec::with_capacity(pairs.len());
        for (label, value) in pairs {
            labels.push(label.to_string());
            values.push(value);
        }
        Self { labels, values }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Populates a message from a result row.
///
/// Per column position: a null raw value leaves the field unset (unset and
/// set-to-zero differ under partial-update diffing); a label matching no
/// field descriptor is skipped, tolerating extra columns; everything else is
/// coerced to the runtime representation and set. Labels match
/// case-sensitively, exactly as the executor reported them.
pub fn materialize<M: Message>(fields: &[FieldDescriptor], row: &SqlRow) -> Result<M> {
    let mut builder = M::new_builder();
    for (label, raw) in row.iter() {
        if raw.is_null() {
            continue;
        }
        let Some(field) = fields.iter().find(|f| f.name() == label) else {
            continue;
        };
        if let Some(value) = to_runtime(field, raw)? {
            builder.set_field(field, value)?;
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFoo;
    use crate::message::Message;

    #[test]
    fn test_unknown_columns_and_nulls_are_skipped() {
        let row = SqlRow::from_pairs(vec![
            ("col1", Value::from("lxp1")),
            ("unknown_col", Value::Integer(5)),
            ("col2", Value::Null),
        ]);
        let foo: TestFoo = materialize(TestFoo::descriptor().fields(), &row).unwrap();
        assert_eq!(foo.col1.as_deref(), Some("lxp1"));
        assert_eq!(foo.col2, None);
        assert_eq!(foo.col3, None);
    }

    #[test]
    fn test_all_columns_populate() {
        let row = SqlRow::from_pairs(vec![
            ("col1", Value::from("cocolian")),
            ("col2", Value::Integer(12)),
            ("col3", Value::Double(0.25)),
        ]);
        let foo: TestFoo = materialize(TestFoo::descriptor().fields(), &row).unwrap();
        assert_eq!(foo.col1.as_deref(), Some("cocolian"));
        assert_eq!(foo.col2, Some(12));
        assert_eq!(foo.col3, Some(0.25));
    }

    #[test]
    fn test_labels_match_case_sensitively() {
        let row = SqlRow::from_pairs(vec![("COL1", Value::from("lxp1"))]);
        let foo: TestFoo = materialize(TestFoo::descriptor().fields(), &row).unwrap();
        assert_eq!(foo.col1, None);
    }

    #[test]
    fn test_raw_values_are_coerced_to_the_runtime_type() {
        // Drivers widen INT columns to LONG; the declared runtime type wins.
        let row = SqlRow::from_pairs(vec![("col2", Value::Long(42))]);
        let foo: TestFoo = materialize(TestFoo::descriptor().fields(), &row).unwrap();
        assert_eq!(foo.col2, Some(42));
    }

    #[test]
    fn test_unconvertible_raw_value_fails_fast() {
        let row = SqlRow::from_pairs(vec![("col2", Value::Text("abc".into()))]);
        let result: Result<TestFoo> = materialize(TestFoo::descriptor().fields(), &row);
        assert!(result.is_err());
    }

    #[test]
    fn test_row_accessors() {
        let row = SqlRow::from_pairs(vec![("col1", Value::from("x")), ("col2", Value::Null)]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.labels(), &["col1".to_string(), "col2".to_string()]);
        assert_eq!(row.value_at(0), Some(&Value::from("x")));
        assert_eq!(row.value_at(1), Some(&Value::Null));
        assert_eq!(row.value_at(2), None);
    }
}
