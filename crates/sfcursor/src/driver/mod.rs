//! Boundary with the underlying database driver.
//!
//! The transport, authentication and server-side execution belong to a driver
//! this crate wraps. The driver is reached only through the [`Driver`] and
//! [`ExecutedStatement`] traits, and rows cross the boundary as [`Row`]s of
//! driver-native [`RawCell`]s pushed into a [`RowSink`].
//!
//! [`memory::MemoryDriver`] implements the seam in-process.

pub mod memory;

use std::fmt;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::stream::RowSink;
use crate::types::Value;

pub use memory::{MemoryDriver, ScriptedResult};

/// Failure reported by the driver collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    code: Option<String>,
}

impl DriverError {
    /// Create a driver error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a server error code (e.g. `"002003"`).
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The server error code, if the driver reported one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A driver-native timestamp cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawTimestamp {
    /// Whole seconds since the Unix epoch (UTC).
    pub epoch_seconds: i64,
    /// Fractional part in nanoseconds.
    pub nanoseconds: u32,
    /// Declared fractional-second digits.
    pub scale: u8,
    /// Offset from UTC in minutes, `None` for `TIMESTAMP_NTZ`.
    pub timezone_offset_minutes: Option<i32>,
}

/// One cell as the driver delivers it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// SQL NULL.
    Null,
    /// BOOLEAN.
    Boolean(bool),
    /// Integral NUMBER values.
    Integer(i64),
    /// NUMBER with a non-zero scale or beyond `i64`.
    Decimal(BigDecimal),
    /// FLOAT / DOUBLE / REAL.
    Real(f64),
    /// Character data.
    Text(String),
    /// BINARY / VARBINARY.
    Binary(Vec<u8>),
    /// DATE as days since the Unix epoch.
    Date(i32),
    /// TIME as nanoseconds since midnight.
    Time(u64),
    /// Any TIMESTAMP flavor.
    Timestamp(RawTimestamp),
    /// VARIANT / ARRAY / OBJECT.
    Structured(serde_json::Value),
}

/// One row of driver cells, in server column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<RawCell>,
}

impl Row {
    /// Create a row from its cells.
    #[must_use]
    pub const fn new(cells: Vec<RawCell>) -> Self {
        Self { cells }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the row has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at a 0-based column index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RawCell> {
        self.cells.get(index)
    }

    /// All cells.
    #[must_use]
    pub fn cells(&self) -> &[RawCell] {
        &self.cells
    }
}

impl From<Vec<RawCell>> for Row {
    fn from(cells: Vec<RawCell>) -> Self {
        Self::new(cells)
    }
}

/// Driver-native column metadata, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    /// Column name.
    pub name: String,
    /// Declared SQL type tag, e.g. `TIMESTAMP_NTZ(3)`.
    pub type_name: String,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Digits after the decimal point, when reported.
    pub scale: Option<u8>,
    /// Total significant digits, when reported.
    pub precision: Option<u8>,
    /// Maximum length for character/binary types, when reported.
    pub length: Option<u64>,
}

impl RawColumn {
    /// A nullable column with no precision information.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            scale: None,
            precision: None,
            length: None,
        }
    }

    /// Set nullability.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set scale.
    #[must_use]
    pub const fn scale(mut self, scale: u8) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set precision.
    #[must_use]
    pub const fn precision(mut self, precision: u8) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Set length.
    #[must_use]
    pub const fn length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }
}

/// SQL text plus positional bind values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    sql_text: String,
    binds: Vec<Value>,
}

impl Query {
    /// A query without binds.
    #[must_use]
    pub fn new(sql_text: impl Into<String>) -> Self {
        Self {
            sql_text: sql_text.into(),
            binds: Vec::new(),
        }
    }

    /// Append a positional bind value (`?` / `:1` placeholders).
    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// The SQL text.
    #[must_use]
    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    /// Bind values in placeholder order.
    #[must_use]
    pub fn binds(&self) -> &[Value] {
        &self.binds
    }
}

impl From<&str> for Query {
    fn from(sql_text: &str) -> Self {
        Self::new(sql_text)
    }
}

impl From<String> for Query {
    fn from(sql_text: String) -> Self {
        Self::new(sql_text)
    }
}

/// A session-oriented connection that submits queries to the server.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Submit a query and return its server-side statement handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the query.
    fn submit(&self, query: &Query) -> DriverResult<Box<dyn ExecutedStatement>>;
}

/// Handle to one submitted server-side statement.
pub trait ExecutedStatement: Send + fmt::Debug {
    /// Server-assigned query identifier.
    fn query_id(&self) -> &str;

    /// SQL text as submitted.
    fn sql_text(&self) -> &str;

    /// Result column metadata, in server order.
    fn columns(&self) -> &[RawColumn];

    /// Total row count when the server reports it up front.
    fn row_count(&self) -> Option<u64>;

    /// Start delivering rows into `sink`.
    ///
    /// Rows may be pushed from another thread after this returns. The driver
    /// signals the end of the stream with [`RowSink::complete`] or
    /// [`RowSink::fail`].
    ///
    /// # Errors
    ///
    /// Returns an error if the row stream cannot be opened.
    fn stream_rows(&mut self, sink: RowSink) -> DriverResult<()>;

    /// Release the server-side cursor. Must be safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the release.
    fn close(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_code() {
        let err = DriverError::new("Object does not exist").with_code("002003");
        assert_eq!(err.code(), Some("002003"));
        assert_eq!(err.to_string(), "Object does not exist");
    }

    #[test]
    fn test_query_binds() {
        let query = Query::new("SELECT * FROM T WHERE ID = ? AND NAME = ?")
            .bind(7_i64)
            .bind("alice");
        assert_eq!(query.binds().len(), 2);
        assert_eq!(query.binds()[0], Value::Integer(7));
        assert_eq!(query.sql_text(), "SELECT * FROM T WHERE ID = ? AND NAME = ?");
    }

    #[test]
    fn test_row_access() {
        let row = Row::from(vec![RawCell::Integer(1), RawCell::Null]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(1), Some(&RawCell::Null));
        assert!(row.get(2).is_none());
    }

    #[test]
    fn test_raw_column_builder() {
        let col = RawColumn::new("TS", "TIMESTAMP_NTZ").scale(3).nullable(false);
        assert_eq!(col.scale, Some(3));
        assert!(!col.nullable);
    }
}
