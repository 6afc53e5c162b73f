//! Error hierarchy for sfcursor.
//!
//! Follows the "canonical error struct" pattern: a single public error type
//! wrapping a private `ErrorKind`, with `is_xxx()` predicates for
//! classification. The error is `Clone` so a terminal stream failure can be
//! handed back to every later call on the same result set.

use thiserror::Error;

/// Root error type for the statement and result-set layer.
///
/// # Example
///
/// ```rust,ignore
/// use sfcursor::CursorError;
///
/// fn handle_error(err: &CursorError) {
///     if err.is_stream_failure() {
///         eprintln!("result stream broke, re-issue the query");
///     } else if err.is_unknown_column() {
///         eprintln!("bad column reference");
///     }
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct CursorError {
    kind: ErrorKind,
}

/// Internal error classification.
///
/// `pub(crate)` so variants can be added without breaking changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    #[error("statement has not been executed")]
    NotExecuted,

    #[error("statement was already executed; call resubmit() to run it again")]
    AlreadyExecuted,

    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("unsupported SQL type: {type_name}")]
    UnsupportedType { type_name: String },

    #[error("cursor is not positioned on a row")]
    CursorNotPositioned,

    #[error("result stream failed: {message}")]
    StreamFailure { message: String },

    #[error("timed out after {millis}ms waiting for row {row}")]
    RowWaitTimeout { row: u64, millis: u128 },

    #[error("cannot read column '{column}' as {target}: {message}")]
    TypeMismatch {
        column: String,
        target: &'static str,
        message: String,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CursorError {
    // ═══════════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════════

    /// Metadata was requested before the statement was executed.
    #[must_use]
    pub const fn not_executed() -> Self {
        Self {
            kind: ErrorKind::NotExecuted,
        }
    }

    /// `execute()` was called a second time on the same statement.
    #[must_use]
    pub const fn already_executed() -> Self {
        Self {
            kind: ErrorKind::AlreadyExecuted,
        }
    }

    /// A column name or index did not resolve.
    #[must_use]
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnknownColumn {
                column: column.into(),
            },
        }
    }

    /// A SQL type string has no mapping rule.
    #[must_use]
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedType {
                type_name: type_name.into(),
            },
        }
    }

    /// A value was read while no row is current.
    #[must_use]
    pub const fn cursor_not_positioned() -> Self {
        Self {
            kind: ErrorKind::CursorNotPositioned,
        }
    }

    /// The underlying row stream failed.
    #[must_use]
    pub fn stream_failure(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::StreamFailure {
                message: message.into(),
            },
        }
    }

    /// A bounded wait for a row elapsed.
    #[must_use]
    pub const fn row_wait_timeout(row: u64, millis: u128) -> Self {
        Self {
            kind: ErrorKind::RowWaitTimeout { row, millis },
        }
    }

    /// A typed accessor could not coerce the cell.
    #[must_use]
    pub fn type_mismatch(
        column: impl Into<String>,
        target: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::TypeMismatch {
                column: column.into(),
                target,
                message: message.into(),
            },
        }
    }

    /// A value failed range validation.
    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidValue(message.into()),
        }
    }

    /// The driver collaborator reported a failure.
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Driver(message.into()),
        }
    }

    /// Configuration could not be loaded or validated.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config(message.into()),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicate Methods (is_xxx)
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns true if this is a not-executed error.
    #[must_use]
    pub const fn is_not_executed(&self) -> bool {
        matches!(self.kind, ErrorKind::NotExecuted)
    }

    /// Returns true if this is an already-executed error.
    #[must_use]
    pub const fn is_already_executed(&self) -> bool {
        matches!(self.kind, ErrorKind::AlreadyExecuted)
    }

    /// Returns true if this is an unknown column error.
    #[must_use]
    pub const fn is_unknown_column(&self) -> bool {
        matches!(self.kind, ErrorKind::UnknownColumn { .. })
    }

    /// Returns true if this is an unsupported type error.
    #[must_use]
    pub const fn is_unsupported_type(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedType { .. })
    }

    /// Returns true if this is a cursor-not-positioned error.
    #[must_use]
    pub const fn is_cursor_not_positioned(&self) -> bool {
        matches!(self.kind, ErrorKind::CursorNotPositioned)
    }

    /// Returns true if this is a terminal stream failure.
    #[must_use]
    pub const fn is_stream_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::StreamFailure { .. })
    }

    /// Returns true if a bounded row wait elapsed.
    #[must_use]
    pub const fn is_row_wait_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::RowWaitTimeout { .. })
    }

    /// Returns true if this is a typed-accessor mismatch.
    #[must_use]
    pub const fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::TypeMismatch { .. })
    }

    /// Returns true if this is an invalid value error.
    #[must_use]
    pub const fn is_invalid_value(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidValue(_))
    }

    /// Returns true if this came from the driver collaborator.
    #[must_use]
    pub const fn is_driver_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Driver(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }

    /// The offending SQL type for an unsupported type error.
    #[must_use]
    pub fn unsupported_type_name(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::UnsupportedType { type_name } => Some(type_name),
            _ => None,
        }
    }
}

impl From<crate::driver::DriverError> for CursorError {
    fn from(err: crate::driver::DriverError) -> Self {
        Self::driver(err.to_string())
    }
}

/// Result type alias for cursor operations.
pub type Result<T> = std::result::Result<T, CursorError>;
