//! Generic type mapping from declared SQL type strings.
//!
//! # Mapping Table
//!
//! Rules are checked in order; the first match wins. Input is trimmed and
//! uppercased first.
//!
//! | Rule | SQL type | Generic type |
//! |------|----------|--------------|
//! | 1 | `BOOLEAN` | Boolean |
//! | 2 | `DATE` | Date |
//! | 3 | `ARRAY`, `VARIANT` | Structured |
//! | 4 | `REAL`, `FLOAT*`, `DOUBLE*` | Float |
//! | 5 | `STRING`, `TEXT`, `TIME`, `*CHAR*` | Text |
//! | 6 | `*TIMESTAMP*` | Timestamp |
//!
//! Anything else (`NUMBER`, `BINARY`, `OBJECT`, `GEOGRAPHY`, ...) has no
//! generic type and is reported as unsupported.

use std::fmt;

use crate::error::{CursorError, Result};

/// Coarse type family used by callers that do not care about precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericType {
    /// True/false.
    Boolean,
    /// Calendar date.
    Date,
    /// JSON-like document (`ARRAY`, `VARIANT`).
    Structured,
    /// Floating point number.
    Float,
    /// Character data.
    Text,
    /// High-precision timestamp.
    Timestamp,
}

impl GenericType {
    /// Upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Structured => "STRUCTURED",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a declared SQL type to its generic type.
///
/// # Errors
///
/// Returns [`CursorError::unsupported_type`] carrying the offending type
/// string when no rule matches.
///
/// # Example
///
/// ```rust
/// use sfcursor::{GenericType, map_sql_type_to_generic_type};
///
/// assert_eq!(map_sql_type_to_generic_type("varchar(16)").unwrap(), GenericType::Text);
/// assert!(map_sql_type_to_generic_type("GEOGRAPHY").is_err());
/// ```
pub fn map_sql_type_to_generic_type(type_str: &str) -> Result<GenericType> {
    let normalized = type_str.trim().to_ascii_uppercase();
    let t = normalized.as_str();

    let generic = match t {
        "BOOLEAN" => GenericType::Boolean,
        "DATE" => GenericType::Date,
        "ARRAY" | "VARIANT" => GenericType::Structured,
        "REAL" => GenericType::Float,
        _ if t.starts_with("FLOAT") || t.starts_with("DOUBLE") => GenericType::Float,
        "STRING" | "TEXT" | "TIME" => GenericType::Text,
        _ if t.contains("CHAR") => GenericType::Text,
        _ if t.contains("TIMESTAMP") => GenericType::Timestamp,
        _ => {
            tracing::warn!(sql_type = %type_str, "no generic type for SQL type");
            return Err(CursorError::unsupported_type(type_str));
        }
    };
    Ok(generic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matches() {
        assert_eq!(map_sql_type_to_generic_type("BOOLEAN").unwrap(), GenericType::Boolean);
        assert_eq!(map_sql_type_to_generic_type("DATE").unwrap(), GenericType::Date);
        assert_eq!(map_sql_type_to_generic_type("ARRAY").unwrap(), GenericType::Structured);
        assert_eq!(map_sql_type_to_generic_type("VARIANT").unwrap(), GenericType::Structured);
        assert_eq!(map_sql_type_to_generic_type("REAL").unwrap(), GenericType::Float);
        assert_eq!(map_sql_type_to_generic_type("STRING").unwrap(), GenericType::Text);
        assert_eq!(map_sql_type_to_generic_type("TEXT").unwrap(), GenericType::Text);
    }

    #[test]
    fn test_time_maps_to_text() {
        assert_eq!(map_sql_type_to_generic_type("TIME").unwrap(), GenericType::Text);
    }

    #[test]
    fn test_prefix_and_contains_rules() {
        assert_eq!(map_sql_type_to_generic_type("FLOAT8").unwrap(), GenericType::Float);
        assert_eq!(
            map_sql_type_to_generic_type("DOUBLE PRECISION").unwrap(),
            GenericType::Float
        );
        assert_eq!(map_sql_type_to_generic_type("VARCHAR(10)").unwrap(), GenericType::Text);
        assert_eq!(map_sql_type_to_generic_type("NCHAR").unwrap(), GenericType::Text);
        assert_eq!(
            map_sql_type_to_generic_type("TIMESTAMP_NTZ(9)").unwrap(),
            GenericType::Timestamp
        );
        assert_eq!(
            map_sql_type_to_generic_type("TIMESTAMP_TZ").unwrap(),
            GenericType::Timestamp
        );
    }

    #[test]
    fn test_mapping_is_idempotent() {
        for t in ["FLOAT4", "CHAR(10)", "TIMESTAMP_LTZ", "VARIANT"] {
            let first = map_sql_type_to_generic_type(t).unwrap();
            let second = map_sql_type_to_generic_type(t).unwrap();
            assert_eq!(first, second, "{t}");
        }
        assert_eq!(map_sql_type_to_generic_type("FLOAT4").unwrap(), GenericType::Float);
        assert_eq!(map_sql_type_to_generic_type("CHAR(10)").unwrap(), GenericType::Text);
    }

    #[test]
    fn test_input_is_normalized() {
        assert_eq!(map_sql_type_to_generic_type("  boolean ").unwrap(), GenericType::Boolean);
        assert_eq!(map_sql_type_to_generic_type("varchar").unwrap(), GenericType::Text);
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both CHAR and TIMESTAMP: the text rule comes first.
        assert_eq!(
            map_sql_type_to_generic_type("CHAR_TIMESTAMP").unwrap(),
            GenericType::Text
        );
    }

    #[test]
    fn test_unsupported_types_carry_the_input() {
        for t in ["GEOGRAPHY", "NUMBER(38,0)", "OBJECT", "BINARY", "", "DATETIME2X"] {
            let err = map_sql_type_to_generic_type(t).unwrap_err();
            assert!(err.is_unsupported_type(), "{t}");
            assert_eq!(err.unsupported_type_name(), Some(t));
        }
    }
}
