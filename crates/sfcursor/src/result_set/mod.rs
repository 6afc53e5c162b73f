//! Pull-based cursor over a pushed row stream.
//!
//! The driver pushes rows into the buffer behind a [`RowReceiver`]; the
//! [`ResultSet`] pulls them one at a time with [`next`](ResultSet::next).
//! Reading a row that has not arrived yet waits for it.
//!
//! # Failure
//!
//! A failed stream is terminal. Rows buffered before the failure are visited
//! normally; the `next()` call that would move past them returns the
//! failure, and from then on `next()`, `column_value()` and `get()` return
//! the same error. [`value_at`](ResultSet::value_at) keeps serving the
//! buffered rows.

use std::sync::Arc;

use crate::column::{ColumnDescriptor, ColumnRef};
use crate::config::CursorConfig;
use crate::driver::Row;
use crate::error::{CursorError, Result};
use crate::statement::{ServerCursor, StatementMetadata};
use crate::stream::{RowReceiver, RowWait, StreamProbe};
use crate::types::{FromValue, Value};

#[derive(Debug)]
enum Position {
    BeforeFirst,
    OnRow { index: usize, row: Arc<Row> },
    AfterLast,
}

/// Rows of one executed statement, read through a forward-only cursor.
///
/// Column references are 0-based indexes or names (see [`ColumnRef`]).
#[derive(Debug)]
pub struct ResultSet {
    metadata: Arc<StatementMetadata>,
    server_cursor: Arc<ServerCursor>,
    rows: RowReceiver,
    probe: StreamProbe,
    position: Position,
    failure: Option<CursorError>,
    config: Arc<CursorConfig>,
}

impl ResultSet {
    pub(crate) fn new(
        metadata: Arc<StatementMetadata>,
        server_cursor: Arc<ServerCursor>,
        rows: RowReceiver,
        config: Arc<CursorConfig>,
    ) -> Self {
        let probe = rows.probe();
        Self {
            metadata,
            server_cursor,
            rows,
            probe,
            position: Position::BeforeFirst,
            failure: None,
            config,
        }
    }

    /// Advance to the next row.
    ///
    /// Returns `Ok(true)` when positioned on a row and `Ok(false)` once every
    /// row was visited. Waits while the next row is still in flight.
    ///
    /// # Errors
    ///
    /// - the terminal stream failure, once the buffered rows are exhausted
    /// - a row wait timeout when the configured bound elapses; the cursor
    ///   does not move and `next()` may be called again
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<bool> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let target = match &self.position {
            Position::BeforeFirst => 0,
            Position::OnRow { index, .. } => index + 1,
            Position::AfterLast => return Ok(false),
        };

        match self.rows.wait_for_row(target, self.config.row_wait_timeout) {
            RowWait::Ready(row) => {
                self.position = Position::OnRow { index: target, row };
                Ok(true)
            }
            RowWait::Exhausted => {
                tracing::trace!(query_id = %self.metadata.query_id(), rows = target, "cursor exhausted");
                self.position = Position::AfterLast;
                Ok(false)
            }
            RowWait::Failed(err) => {
                tracing::warn!(
                    query_id = %self.metadata.query_id(),
                    row = target,
                    error = %err,
                    "result stream failed"
                );
                self.failure = Some(err.clone());
                Err(err)
            }
            RowWait::TimedOut => Err(self.timeout_error(target)),
        }
    }

    /// Value of a column in the current row.
    ///
    /// Timestamp cells come back as
    /// [`Value::Timestamp`](crate::types::Value::Timestamp); other cells are
    /// passed through.
    pub fn column_value(&self, col: impl Into<ColumnRef>) -> Result<Value> {
        self.current_cell(col.into()).map(|(_, value)| value)
    }

    /// Canonical text rendering of a column in the current row.
    ///
    /// NULL renders as the configured null string (empty by default). TIME
    /// values use the column scale.
    pub fn column_value_as_string(&self, col: impl Into<ColumnRef>) -> Result<String> {
        let (index, value) = self.current_cell(col.into())?;
        let scale = self.metadata.columns()[index].scale();
        Ok(value.render(scale, &self.config.null_string))
    }

    /// Typed value of a column in the current row.
    ///
    /// ```rust
    /// use sfcursor::Connection;
    /// use sfcursor::driver::{MemoryDriver, RawCell, RawColumn, ScriptedResult};
    ///
    /// let driver = MemoryDriver::new();
    /// driver.script(
    ///     "SELECT NAME, NICK FROM USERS",
    ///     ScriptedResult::new(vec![
    ///         RawColumn::new("NAME", "VARCHAR"),
    ///         RawColumn::new("NICK", "VARCHAR"),
    ///     ])
    ///     .row(vec![RawCell::Text("Ada".into()), RawCell::Null]),
    /// );
    /// let mut rs = Connection::new(driver).execute("SELECT NAME, NICK FROM USERS").unwrap();
    ///
    /// assert!(rs.next().unwrap());
    /// assert_eq!(rs.get::<String>("NAME").unwrap(), "Ada");
    /// assert_eq!(rs.get::<Option<String>>(1).unwrap(), None);
    /// ```
    pub fn get<T: FromValue>(&self, col: impl Into<ColumnRef>) -> Result<T> {
        let (index, value) = self.current_cell(col.into())?;
        T::from_value(self.metadata.columns()[index].name(), value)
    }

    /// Value at any row index below the known row count, waiting for it to
    /// arrive. Does not move the cursor.
    ///
    /// # Errors
    ///
    /// Fails with a cursor-not-positioned error when `row` is past the end
    /// of a completed stream, and with the stream failure when the stream
    /// failed before delivering `row`.
    pub fn value_at(&self, row: usize, col: impl Into<ColumnRef>) -> Result<Value> {
        let index = self.metadata.resolve(&col.into())?;
        match self.rows.wait_for_row(row, self.config.row_wait_timeout) {
            RowWait::Ready(cells) => Self::cell(&cells, index),
            RowWait::Exhausted => Err(CursorError::cursor_not_positioned()),
            RowWait::Failed(err) => Err(err),
            RowWait::TimedOut => Err(self.timeout_error(row)),
        }
    }

    /// Declared SQL type tag of a column.
    pub fn column_sql_type(&self, col: impl Into<ColumnRef>) -> Result<&str> {
        self.metadata
            .descriptor(&col.into())
            .map(ColumnDescriptor::sql_type)
    }

    /// Descriptor of a column.
    pub fn column_descriptor(&self, col: impl Into<ColumnRef>) -> Result<&ColumnDescriptor> {
        self.metadata.descriptor(&col.into())
    }

    /// Query id of the execution that produced these rows.
    #[must_use]
    pub fn query_id(&self) -> &str {
        self.metadata.query_id()
    }

    /// Metadata snapshot shared with the statement.
    #[must_use]
    pub fn metadata(&self) -> &StatementMetadata {
        &self.metadata
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.metadata.column_count()
    }

    /// Column descriptors in server order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.metadata.columns()
    }

    /// 0-based index of the current row; `None` before the first `next()`
    /// and after the last row.
    #[must_use]
    pub const fn current_row_index(&self) -> Option<usize> {
        match &self.position {
            Position::OnRow { index, .. } => Some(*index),
            Position::BeforeFirst | Position::AfterLast => None,
        }
    }

    /// Rows known to exist: the announced total, or the rows received so far.
    #[must_use]
    pub fn known_row_count(&self) -> u64 {
        self.probe.known_row_count()
    }

    /// Rows received so far.
    #[must_use]
    pub fn buffered_row_count(&self) -> usize {
        self.probe.buffered_rows()
    }

    /// True once the stream delivered every row.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.probe.is_complete()
    }

    /// True once the server cursor was released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.server_cursor.is_released()
    }

    /// Wait for the stream to finish and return the total row count.
    ///
    /// # Errors
    ///
    /// Returns the stream failure, or a row wait timeout when the configured
    /// bound elapses first.
    pub fn wait_until_complete(&self) -> Result<u64> {
        match self.rows.wait_until_settled(self.config.row_wait_timeout)? {
            Some(total) => Ok(total),
            None => Err(self.timeout_error(self.buffered_row_count())),
        }
    }

    /// Release the server cursor now. Unread rows are discarded.
    pub fn close(self) -> Result<()> {
        self.server_cursor.release()
    }

    /// Drain the stream for buffered mode. A stream failure is kept for
    /// `next()` to report.
    pub(crate) fn drain(&self) -> Result<()> {
        match self.rows.wait_until_settled(self.config.row_wait_timeout) {
            Ok(Some(_)) | Err(_) => Ok(()),
            Ok(None) => Err(self.timeout_error(self.buffered_row_count())),
        }
    }

    fn current_cell(&self, col: ColumnRef) -> Result<(usize, Value)> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let Position::OnRow { row, .. } = &self.position else {
            return Err(CursorError::cursor_not_positioned());
        };
        let index = self.metadata.resolve(&col)?;
        Ok((index, Self::cell(row, index)?))
    }

    fn cell(row: &Row, index: usize) -> Result<Value> {
        row.get(index)
            .cloned()
            .ok_or_else(|| CursorError::stream_failure(format!("row has no cell {index}")))
            .and_then(Value::from_raw)
    }

    fn timeout_error(&self, row: usize) -> CursorError {
        let millis = self
            .config
            .row_wait_timeout
            .map_or(0, |timeout| timeout.as_millis());
        CursorError::row_wait_timeout(row as u64, millis)
    }
}
