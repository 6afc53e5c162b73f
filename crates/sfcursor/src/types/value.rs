//! Typed cell values and their canonical text rendering.

use std::fmt::Write as _;

use bigdecimal::BigDecimal;

use super::temporal::{MAX_SCALE, format_date, format_time};
use crate::driver::RawCell;
use crate::error::Result;
use crate::timestamp::HighPrecisionTimestamp;

/// One cell of the current row, as handed to application code.
///
/// Mirrors [`RawCell`] except that timestamps are wrapped in
/// [`HighPrecisionTimestamp`], so no driver type leaks through.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// BOOLEAN.
    Boolean(bool),
    /// Integral NUMBER.
    Integer(i64),
    /// Fractional or wide NUMBER.
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
    Timestamp(HighPrecisionTimestamp),
    /// VARIANT / ARRAY / OBJECT.
    Structured(serde_json::Value),
}

impl Value {
    /// Convert a driver cell, wrapping timestamps.
    ///
    /// # Errors
    ///
    /// Returns an error if a timestamp cell is out of range.
    pub fn from_raw(cell: RawCell) -> Result<Self> {
        Ok(match cell {
            RawCell::Null => Self::Null,
            RawCell::Boolean(v) => Self::Boolean(v),
            RawCell::Integer(v) => Self::Integer(v),
            RawCell::Decimal(v) => Self::Decimal(v),
            RawCell::Real(v) => Self::Real(v),
            RawCell::Text(v) => Self::Text(v),
            RawCell::Binary(v) => Self::Binary(v),
            RawCell::Date(v) => Self::Date(v),
            RawCell::Time(v) => Self::Time(v),
            RawCell::Timestamp(raw) => Self::Timestamp(HighPrecisionTimestamp::from_raw(raw)?),
            RawCell::Structured(v) => Self::Structured(v),
        })
    }

    /// Short name of the variant, used in mismatch messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Decimal(_) => "DECIMAL",
            Self::Real(_) => "REAL",
            Self::Text(_) => "TEXT",
            Self::Binary(_) => "BINARY",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Structured(_) => "STRUCTURED",
        }
    }

    /// True for SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// The timestamp, if this is one.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&HighPrecisionTimestamp> {
        match self {
            Self::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    /// Canonical text form.
    ///
    /// `time_scale` sets the fractional digits of TIME values (defaults to 9);
    /// `null` is returned for NULL.
    #[must_use]
    pub fn render(&self, time_scale: Option<u8>, null: &str) -> String {
        match self {
            Self::Null => null.to_string(),
            Self::Boolean(v) => v.to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Decimal(v) => v.to_plain_string(),
            Self::Real(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::Binary(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(out, "{b:02X}");
                }
                out
            }
            Self::Date(days) => format_date(i64::from(*days)),
            Self::Time(nanos) => format_time(*nanos, time_scale.unwrap_or(MAX_SCALE)),
            Self::Timestamp(ts) => ts.to_display_string(),
            Self::Structured(json) => json.to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<HighPrecisionTimestamp> for Value {
    fn from(v: HighPrecisionTimestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Self::Structured(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
