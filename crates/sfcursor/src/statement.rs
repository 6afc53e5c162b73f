//! Statements: submission, metadata snapshot and result-set factory.
//!
//! A [`Statement`] is created by a [`Connection`](crate::Connection) and runs
//! its query once through [`execute`](Statement::execute). Metadata becomes
//! available at that point and is frozen in a [`StatementMetadata`] snapshot
//! shared with the [`ResultSet`].
//!
//! The driver's server-side cursor is held by a guard shared between the
//! statement and its result set. It is released on [`Statement::close`],
//! [`ResultSet::close`], on every exit of [`Statement::with_result_set`], and
//! otherwise when the last of them is dropped.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::column::{ColumnDescriptor, ColumnRef};
use crate::config::{CursorConfig, CursorMode};
use crate::driver::{Driver, ExecutedStatement, Query};
use crate::error::{CursorError, Result};
use crate::observability;
use crate::result_set::ResultSet;
use crate::stream::{self, StreamProbe};
use crate::types::GenericType;

/// Immutable per-execution metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementMetadata {
    query_id: String,
    sql_text: String,
    columns: Vec<ColumnDescriptor>,
    eager_row_count: Option<u64>,
}

impl StatementMetadata {
    fn from_handle(handle: &dyn ExecutedStatement) -> Self {
        Self {
            query_id: handle.query_id().to_string(),
            sql_text: handle.sql_text().to_string(),
            columns: handle
                .columns()
                .iter()
                .map(ColumnDescriptor::from_raw)
                .collect(),
            eager_row_count: handle.row_count(),
        }
    }

    /// Server-assigned query id.
    #[must_use]
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// SQL text as submitted.
    #[must_use]
    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    /// Column descriptors in server order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of result columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Row count reported by the server before streaming, if any.
    #[must_use]
    pub const fn eager_row_count(&self) -> Option<u64> {
        self.eager_row_count
    }

    /// Resolve a column reference to its 0-based index.
    pub fn resolve(&self, col: &ColumnRef) -> Result<usize> {
        col.resolve(&self.columns)
    }

    /// Descriptor of a column.
    pub fn descriptor(&self, col: &ColumnRef) -> Result<&ColumnDescriptor> {
        let index = self.resolve(col)?;
        Ok(&self.columns[index])
    }
}

/// Owner of the driver's statement handle; closes it at most once.
#[derive(Debug)]
pub(crate) struct ServerCursor {
    query_id: String,
    handle: Mutex<Option<Box<dyn ExecutedStatement>>>,
}

impl ServerCursor {
    fn new(query_id: &str, handle: Box<dyn ExecutedStatement>) -> Self {
        Self {
            query_id: query_id.to_string(),
            handle: Mutex::new(Some(handle)),
        }
    }

    pub(crate) fn release(&self) -> Result<()> {
        let handle = self.handle.lock().take();
        if let Some(mut handle) = handle {
            handle.close()?;
            tracing::debug!(query_id = %self.query_id, "released server cursor");
        }
        Ok(())
    }

    pub(crate) fn is_released(&self) -> bool {
        self.handle.lock().is_none()
    }
}

impl Drop for ServerCursor {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(
                query_id = %self.query_id,
                error = %err,
                "failed to release server cursor"
            );
        }
    }
}

#[derive(Debug)]
struct Execution {
    metadata: Arc<StatementMetadata>,
    cursor: Arc<ServerCursor>,
    probe: StreamProbe,
}

/// A query bound to a connection, executed at most once.
///
/// # Example
///
/// ```rust
/// use sfcursor::Connection;
/// use sfcursor::driver::{MemoryDriver, RawCell, RawColumn, ScriptedResult};
///
/// let driver = MemoryDriver::new();
/// driver.script(
///     "SELECT ID FROM USERS",
///     ScriptedResult::new(vec![RawColumn::new("ID", "NUMBER(38,0)")])
///         .row(vec![RawCell::Integer(1)]),
/// );
/// let conn = Connection::new(driver);
///
/// let mut stmt = conn.create_statement("SELECT ID FROM USERS");
/// assert!(stmt.column_count().unwrap_err().is_not_executed());
///
/// let mut rs = stmt.execute().unwrap();
/// assert_eq!(stmt.column_count().unwrap(), 1);
/// assert!(rs.next().unwrap());
/// assert_eq!(rs.get::<i64>("ID").unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct Statement {
    driver: Arc<dyn Driver>,
    query: Query,
    config: Arc<CursorConfig>,
    execution: Option<Execution>,
}

impl Statement {
    pub(crate) fn new(driver: Arc<dyn Driver>, query: Query, config: Arc<CursorConfig>) -> Self {
        Self {
            driver,
            query,
            config,
            execution: None,
        }
    }

    /// SQL text; available before execution.
    #[must_use]
    pub fn sql_text(&self) -> &str {
        self.query.sql_text()
    }

    /// The query with its bind values.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// True once `execute()` succeeded.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        self.execution.is_some()
    }

    /// Submit the query and return a result set over its rows.
    ///
    /// # Errors
    ///
    /// Fails with an already-executed error on a second call, with a driver
    /// error when submission fails, and in buffered mode with a row wait
    /// timeout when draining exceeds the configured bound.
    pub fn execute(&mut self) -> Result<ResultSet> {
        if self.execution.is_some() {
            return Err(CursorError::already_executed());
        }
        self.submit()
    }

    /// Release the previous execution, if any, and submit the query again.
    ///
    /// The new execution has its own query id, metadata and row stream.
    pub fn resubmit(&mut self) -> Result<ResultSet> {
        if let Some(previous) = self.execution.take()
            && let Err(err) = previous.cursor.release()
        {
            tracing::warn!(
                query_id = %previous.metadata.query_id(),
                error = %err,
                "failed to release previous execution"
            );
        }
        self.submit()
    }

    /// Execute, run `f` on the result set, then release the server cursor
    /// whether `f` succeeded or not.
    ///
    /// An error from `f` takes precedence over a release error.
    pub fn with_result_set<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ResultSet) -> Result<T>,
    {
        let mut result_set = self.execute()?;
        let outcome = f(&mut result_set);
        drop(result_set);

        let released = self
            .execution
            .as_ref()
            .map_or(Ok(()), |execution| execution.cursor.release());

        let value = outcome?;
        released?;
        Ok(value)
    }

    /// Release the server cursor now.
    ///
    /// Result sets drawn from this statement keep the rows they already
    /// buffered.
    pub fn close(self) -> Result<()> {
        match &self.execution {
            Some(execution) => execution.cursor.release(),
            None => Ok(()),
        }
    }

    fn submit(&mut self) -> Result<ResultSet> {
        let mut handle = self.driver.submit(&self.query)?;
        let metadata = Arc::new(StatementMetadata::from_handle(handle.as_ref()));

        let prefetch = match self.config.mode {
            CursorMode::Streaming => self.config.prefetch_rows,
            CursorMode::Buffered => None,
        };
        let (sink, receiver) =
            stream::channel(metadata.column_count(), metadata.eager_row_count(), prefetch);

        if let Err(err) = handle.stream_rows(sink) {
            if let Err(close_err) = handle.close() {
                tracing::warn!(
                    query_id = %metadata.query_id(),
                    error = %close_err,
                    "failed to release server cursor"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            query_id = %metadata.query_id(),
            columns = metadata.column_count(),
            rows = ?metadata.eager_row_count(),
            "statement executed"
        );
        observability::record_statement();

        let cursor = Arc::new(ServerCursor::new(metadata.query_id(), handle));
        let execution = Execution {
            metadata: Arc::clone(&metadata),
            cursor: Arc::clone(&cursor),
            probe: receiver.probe(),
        };

        let result_set = ResultSet::new(metadata, cursor, receiver, Arc::clone(&self.config));
        // A failed drain drops the result set and releases the cursor.
        if self.config.mode == CursorMode::Buffered {
            result_set.drain()?;
        }
        self.execution = Some(execution);
        Ok(result_set)
    }

    fn execution(&self) -> Result<&Execution> {
        self.execution.as_ref().ok_or_else(CursorError::not_executed)
    }

    fn with_column<T>(
        &self,
        col: impl Into<ColumnRef>,
        f: impl FnOnce(&ColumnDescriptor) -> T,
    ) -> Result<T> {
        let metadata = &self.execution()?.metadata;
        metadata.descriptor(&col.into()).map(f)
    }

    /// Metadata snapshot of the current execution.
    pub fn metadata(&self) -> Result<&StatementMetadata> {
        Ok(&self.execution()?.metadata)
    }

    /// Server-assigned query id.
    pub fn query_id(&self) -> Result<&str> {
        Ok(self.execution()?.metadata.query_id())
    }

    /// Number of result columns.
    pub fn column_count(&self) -> Result<usize> {
        Ok(self.execution()?.metadata.column_count())
    }

    /// Total rows: `Some` once announced by the server or once the stream
    /// completed, `None` while still streaming without an announced total.
    pub fn row_count(&self) -> Result<Option<u64>> {
        Ok(self.execution()?.probe.final_row_count())
    }

    /// All column descriptors in server order.
    pub fn columns(&self) -> Result<&[ColumnDescriptor]> {
        Ok(self.execution()?.metadata.columns())
    }

    /// Descriptor of one column.
    pub fn column_descriptor(&self, col: impl Into<ColumnRef>) -> Result<&ColumnDescriptor> {
        self.execution()?.metadata.descriptor(&col.into())
    }

    /// Column name.
    pub fn column_name(&self, col: impl Into<ColumnRef>) -> Result<&str> {
        self.column_descriptor(col).map(ColumnDescriptor::name)
    }

    /// Declared SQL type tag.
    pub fn column_sql_type(&self, col: impl Into<ColumnRef>) -> Result<&str> {
        self.column_descriptor(col).map(ColumnDescriptor::sql_type)
    }

    /// Generic type of the column's SQL type.
    pub fn column_type(&self, col: impl Into<ColumnRef>) -> Result<GenericType> {
        self.column_descriptor(col)?.generic_type()
    }

    /// Column scale.
    pub fn column_scale(&self, col: impl Into<ColumnRef>) -> Result<Option<u8>> {
        self.with_column(col, ColumnDescriptor::scale)
    }

    /// Whether the column allows NULL.
    pub fn is_column_nullable(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::nullable)
    }

    /// Whether the column holds character data.
    pub fn is_column_text(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_text)
    }

    /// Whether the column is an ARRAY.
    pub fn is_column_array(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_array)
    }

    /// Whether the column is binary.
    pub fn is_column_binary(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_binary)
    }

    /// Whether the column is BOOLEAN.
    pub fn is_column_boolean(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_boolean)
    }

    /// Whether the column is a DATE.
    pub fn is_column_date(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_date)
    }

    /// Whether the column is numeric.
    pub fn is_column_number(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_number)
    }

    /// Whether the column is an OBJECT.
    pub fn is_column_object(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_object)
    }

    /// Whether the column is a TIME.
    pub fn is_column_time(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_time)
    }

    /// Whether the column is any TIMESTAMP flavor.
    pub fn is_column_timestamp(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_timestamp)
    }

    /// Whether the column is a VARIANT.
    pub fn is_column_variant(&self, col: impl Into<ColumnRef>) -> Result<bool> {
        self.with_column(col, ColumnDescriptor::is_variant)
    }
}
