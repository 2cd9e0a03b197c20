use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("No table mapping resolvable for message '{0}'")]
    SchemaResolution(String),

    #[error("No usable primary key for '{0}': {1}")]
    MissingPrimaryKey(String, String),

    #[error("No fields set for write to '{0}'")]
    EmptyInsert(String),

    #[error("Condition mismatch: {fields} field names vs {values} values")]
    ArgumentMismatch { fields: usize, values: usize },

    #[error("Cannot coerce {from} to {target} for field '{field}'")]
    TypeCoercion {
        field: String,
        from: String,
        target: String,
    },

    #[error("Partial update of '{table}' found no current row for key {key}")]
    StaleRead { table: String, key: String },

    #[error("Execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, MapperError>;
