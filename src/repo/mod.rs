//! Repository facade: the CRUD surface over one mapped message type.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use log::{debug, error};

use crate::coerce;
use crate::core::{MapperError, Result, Value};
use crate::executor::StatementExecutor;
use crate::message::Message;
use crate::row::materialize;
use crate::schema::{SchemaProvider, StaticSchema, TableAnnotation};
use crate::statement;

/// Maps one message type onto its table through an injected executor.
///
/// The repository resolves the message's table annotation exactly once, on
/// first use, and keeps that resolution for its whole lifetime — even when
/// the annotation was absent at that point. All operations await the
/// executor sequentially; the facade spawns no tasks and holds no locks
/// across awaits. Partial updates perform a read and then a conditional
/// write as two separate round-trips with no isolation between them;
/// concurrent writers race with last-committed-wins semantics.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use protosql::{Message, Repository, Result, SqlRow, StatementExecutor, Value};
///
/// #[derive(Message, Debug, Default)]
/// #[message(table = "foo", primary_key = "col1")]
/// struct Foo {
///     col1: Option<String>,
///     col2: Option<i32>,
/// }
///
/// struct NullExecutor;
///
/// #[async_trait]
/// impl StatementExecutor for NullExecutor {
///     async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<u64> {
///         Ok(1)
///     }
///     async fn query_one(&self, _sql: &str, _params: &[Value]) -> Result<Option<SqlRow>> {
///         Ok(None)
///     }
///     async fn query_many(&self, _sql: &str, _params: &[Value]) -> Result<Vec<SqlRow>> {
///         Ok(Vec::new())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let repo: Repository<Foo, _> = Repository::new(NullExecutor);
///
/// let mut foo = Foo::default();
/// foo.col1 = Some("lxp1".into());
/// foo.col2 = Some(42);
/// assert_eq!(repo.insert(&foo).await?, 1);
/// assert!(repo.get_by_key("lxp1").await?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct Repository<M: Message, E: StatementExecutor> {
    executor: E,
    schema: Arc<dyn SchemaProvider>,
    annotation: OnceLock<TableAnnotation>,
    _message: PhantomData<fn() -> M>,
}

impl<M: Message + 'static, E: StatementExecutor> Repository<M, E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            schema: Arc::new(StaticSchema::<M>::new()),
            annotation: OnceLock::new(),
            _message: PhantomData,
        }
    }

    /// Replaces the annotation source. Must be called before the first
    /// operation; once an annotation has been resolved it is permanent.
    pub fn with_schema_provider(mut self, provider: Arc<dyn SchemaProvider>) -> Self {
        self.schema = provider;
        self
    }

    /// Fetches the row with the given key.
    ///
    /// Zero rows is `Ok(None)`, never an error. With no primary key
    /// configured this logs an error and returns not-found instead of
    /// failing.
    pub async fn get_by_key(&self, key: impl Into<Value> + Send) -> Result<Option<M>> {
        let Some(pk) = self.primary_key() else {
            error!(
                "message {} has no primary key configured, get_by_key returns not-found",
                M::descriptor().name()
            );
            return Ok(None);
        };
        let table = self.table_name()?;
        let sql = statement::select_by_key(table, pk);
        self.fetch_one(&sql, &[key.into()]).await
    }

    /// Runs arbitrary SQL expected to return at most one row.
    pub async fn get_one(&self, sql: &str, params: &[Value]) -> Result<Option<M>> {
        self.fetch_one(sql, params).await
    }

    /// Runs arbitrary SQL and materializes every returned row, in result
    /// order.
    pub async fn query_many(&self, sql: &str, params: &[Value]) -> Result<Vec<M>> {
        debug!("query: {}", sql);
        let rows = self.executor.query_many(sql, params).await?;
        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(materialize(self.schema.fields(), &row)?);
        }
        Ok(messages)
    }

    /// Inserts the message's set fields. Returns the affected row count;
    /// identity values are never read back, callers supply them.
    pub async fn insert(&self, message: &M) -> Result<u64> {
        let table = self.table_name()?;
        let fields = message.set_fields();
        let bound = statement::insert(table, &fields)?;
        debug!("insert: {}", bound.sql);
        self.executor.execute(&bound.sql, &bound.params).await
    }

    /// Updates the row addressed by the message's primary-key value,
    /// writing every other set field.
    ///
    /// Unset fields are left untouched in storage. A message that is not
    /// fully populated therefore performs a sparse update, not a full-row
    /// overwrite.
    pub async fn update(&self, message: &M) -> Result<u64> {
        let table = self.table_name()?;
        let pk = self.require_primary_key()?;
        let fields = message.set_fields();
        let bound = statement::update(table, pk, &fields)?;
        debug!("update: {}", bound.sql);
        self.executor.execute(&bound.sql, &bound.params).await
    }

    /// Updates rows matching the given condition columns, writing the set
    /// fields that are not themselves conditions.
    pub async fn update_by_condition(
        &self,
        message: &M,
        condition_fields: &[&str],
        condition_values: &[Value],
    ) -> Result<u64> {
        if condition_fields.len() != condition_values.len() {
            return Err(MapperError::ArgumentMismatch {
                fields: condition_fields.len(),
                values: condition_values.len(),
            });
        }
        let table = self.table_name()?;
        let fields = message.set_fields();
        let bound = statement::update_by_condition(table, &fields, condition_fields, condition_values)?;
        debug!("update: {}", bound.sql);
        self.executor.execute(&bound.sql, &bound.params).await
    }

    /// Writes only the fields whose staged value differs from the current
    /// row.
    ///
    /// Reads the current row by key, diffs it against the staged fields in
    /// storage representation and updates the changed columns. Zero changed
    /// fields return 0 without issuing any write. The read and the write
    /// are two round-trips with no isolation between them.
    pub async fn partial_update(&self, message: &M) -> Result<u64> {
        let table = self.table_name()?;
        let pk = self.require_primary_key()?;

        let mut staged = Vec::new();
        for (field, value) in message.set_fields() {
            staged.push((field, coerce::to_storage(field, value)?));
        }
        let (key_field, key) = match staged.iter().find(|(field, _)| field.name() == pk) {
            Some((field, value)) => (*field, value.clone()),
            None => {
                return Err(MapperError::MissingPrimaryKey(
                    M::descriptor().name().to_string(),
                    format!("primary key field '{}' is not set", pk),
                ));
            }
        };

        let sql = statement::select_by_key(table, pk);
        debug!("query: {}", sql);
        let row = self
            .executor
            .query_one(&sql, std::slice::from_ref(&key))
            .await?;
        let Some(row) = row else {
            return Err(MapperError::StaleRead {
                table: table.to_string(),
                key: key.to_string(),
            });
        };
        let current: M = materialize(self.schema.fields(), &row)?;
        let mut current_values = HashMap::new();
        for (field, value) in current.set_fields() {
            current_values.insert(field.name().to_string(), coerce::to_storage(field, value)?);
        }

        let mut changed = statement::changed_fields(&staged, &current_values, pk);
        if changed.is_empty() {
            debug!("partial update of {}: no fields changed, skipping write", table);
            return Ok(0);
        }
        changed.push((key_field, key));
        let bound = statement::update(table, pk, &changed)?;
        debug!("partial update: {}", bound.sql);
        self.executor.execute(&bound.sql, &bound.params).await
    }

    /// Raw passthrough for write statements outside the generated shapes.
    pub async fn execute_update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        debug!("execute: {}", sql);
        self.executor.execute(sql, params).await
    }

    /// Base projection (`SELECT * FROM table`) for composing custom
    /// queries against the mapped table.
    pub fn select_statement(&self) -> Result<String> {
        Ok(statement::select_all(self.table_name()?))
    }

    async fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<M>> {
        debug!("query: {}", sql);
        match self.executor.query_one(sql, params).await? {
            Some(row) => Ok(Some(materialize(self.schema.fields(), &row)?)),
            None => Ok(None),
        }
    }

    fn resolve_annotation(&self) -> &TableAnnotation {
        self.annotation
            .get_or_init(|| self.schema.table_annotation())
    }

    fn table_name(&self) -> Result<&str> {
        self.resolve_annotation()
            .resolved_table()
            .ok_or_else(|| MapperError::SchemaResolution(M::descriptor().name().to_string()))
    }

    fn primary_key(&self) -> Option<&str> {
        self.resolve_annotation().resolved_primary_key()
    }

    fn require_primary_key(&self) -> Result<&str> {
        self.primary_key().ok_or_else(|| {
            MapperError::MissingPrimaryKey(
                M::descriptor().name().to_string(),
                "no primary key configured".to_string(),
            )
        })
    }
}
