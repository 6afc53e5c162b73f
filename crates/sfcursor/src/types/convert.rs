//! Typed extraction from [`Value`]s.
//!
//! [`FromValue`] is sealed: external code can call
//! [`ResultSet::get`](crate::ResultSet::get) with any implementing type but
//! cannot add implementations, so new methods can be added to the trait
//! without breaking downstream crates.

use bigdecimal::{BigDecimal, ToPrimitive};

use super::value::Value;
use crate::error::{CursorError, Result};
use crate::timestamp::HighPrecisionTimestamp;

/// Private module that external crates cannot access.
pub(crate) mod private {
    /// Marker trait that seals [`FromValue`](super::FromValue).
    pub trait Sealed {}
}

/// Types a cell can be read as.
///
/// # Sealed
///
/// This trait requires implementing [`private::Sealed`], which is not
/// accessible outside this crate.
pub trait FromValue: private::Sealed + Sized {
    /// Target name used in mismatch errors.
    const TARGET: &'static str;

    /// Convert the value of `column`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::type_mismatch`] when the value has the wrong
    /// type or is out of range for the target.
    fn from_value(column: &str, value: Value) -> Result<Self>;
}

fn mismatch<T: FromValue>(column: &str, value: &Value) -> CursorError {
    CursorError::type_mismatch(column, T::TARGET, format!("found {}", value.type_name()))
}

fn out_of_range<T: FromValue>(column: &str) -> CursorError {
    CursorError::type_mismatch(column, T::TARGET, "value out of range")
}

// ═══════════════════════════════════════════════════════════════════════════
// Sealed Implementations
// ═══════════════════════════════════════════════════════════════════════════

impl private::Sealed for bool {}
impl FromValue for bool {
    const TARGET: &'static str = "bool";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for i64 {}
impl FromValue for i64 {
    const TARGET: &'static str = "i64";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            Value::Decimal(ref d) if d.is_integer() => {
                d.to_i64().ok_or_else(|| out_of_range::<Self>(column))
            }
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for i32 {}
impl FromValue for i32 {
    const TARGET: &'static str = "i32";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        let wide = match value {
            Value::Integer(v) => v,
            Value::Decimal(ref d) if d.is_integer() => {
                d.to_i64().ok_or_else(|| out_of_range::<Self>(column))?
            }
            other => return Err(mismatch::<Self>(column, &other)),
        };
        Self::try_from(wide).map_err(|_| out_of_range::<Self>(column))
    }
}

impl private::Sealed for f64 {}
impl FromValue for f64 {
    const TARGET: &'static str = "f64";

    #[allow(clippy::cast_precision_loss)]
    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Real(v) => Ok(v),
            Value::Integer(v) => Ok(v as Self),
            Value::Decimal(ref d) => d.to_f64().ok_or_else(|| out_of_range::<Self>(column)),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for BigDecimal {}
impl FromValue for BigDecimal {
    const TARGET: &'static str = "decimal";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::Integer(v) => Ok(Self::from(v)),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for String {}
impl FromValue for String {
    const TARGET: &'static str = "string";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for Vec<u8> {}
impl FromValue for Vec<u8> {
    const TARGET: &'static str = "bytes";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Binary(v) => Ok(v),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for HighPrecisionTimestamp {}
impl FromValue for HighPrecisionTimestamp {
    const TARGET: &'static str = "timestamp";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl private::Sealed for serde_json::Value {}
impl FromValue for serde_json::Value {
    const TARGET: &'static str = "json";

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Structured(v) => Ok(v),
            other => Err(mismatch::<Self>(column, &other)),
        }
    }
}

impl<T: FromValue> private::Sealed for Option<T> {}
impl<T: FromValue> FromValue for Option<T> {
    const TARGET: &'static str = T::TARGET;

    fn from_value(column: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(column, other).map(Some),
        }
    }
}
