use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{Result, Value};
use crate::row::SqlRow;

/// Parameterized statement execution, supplied by the caller.
///
/// This trait keeps the mapping core agnostic to the underlying driver: wrap
/// a connection pool, a single connection, or a fake recording executor for
/// tests. Implementations bind `Value::Enum` parameters as their integer
/// code and `Value::Null` as SQL NULL. Connectivity and constraint failures
/// surface as `MapperError::Execution` and pass through the facade
/// unmodified; cancellation and timeout policy live here, not in the core.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Execute a statement that modifies data; returns the affected row
    /// count.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query expected to return at most one row. Zero rows is
    /// `Ok(None)`, never an error.
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<SqlRow>>;

    /// Execute a query returning any number of rows, in result order.
    async fn query_many(&self, sql: &str, params: &[Value]) -> Result<Vec<SqlRow>>;
}

// One shared executor can back any number of repositories.
#[async_trait]
impl<E: StatementExecutor + ?Sized> StatementExecutor for Arc<E> {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params).await
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<SqlRow>> {
        (**self).query_one(sql, params).await
    }

    async fn query_many(&self, sql: &str, params: &[Value]) -> Result<Vec<SqlRow>> {
        (**self).query_many(sql, params).await
    }
}
