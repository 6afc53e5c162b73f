//! Column metadata and column addressing.
//!
//! A [`ColumnDescriptor`] is built once per result column from the driver's
//! [`RawColumn`] when a statement executes, and never changes afterwards.
//! Columns are addressed through [`ColumnRef`]: a 0-based index or a name.

use std::fmt;

use crate::driver::RawColumn;
use crate::error::{CursorError, Result};
use crate::types::mapping::{GenericType, map_sql_type_to_generic_type};
use crate::types::temporal::MAX_SCALE;

/// Timestamp flavors distinguished by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampFlavor {
    /// `TIMESTAMP` / `DATETIME`, whose meaning follows the session mapping.
    Plain,
    /// Local time zone.
    Ltz,
    /// No time zone.
    Ntz,
    /// Explicit offset per value.
    Tz,
}

/// Parsed SQL type family of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// `BOOLEAN`.
    Boolean,
    /// `DATE`.
    Date,
    /// `TIME`.
    Time,
    /// Any timestamp flavor.
    Timestamp(TimestampFlavor),
    /// `ARRAY`.
    Array,
    /// `VARIANT`.
    Variant,
    /// `OBJECT` / `MAP`.
    Object,
    /// Character types.
    Text,
    /// `REAL`, `FLOAT*`, `DOUBLE*`.
    Real,
    /// `NUMBER` and its integer/decimal aliases.
    Number,
    /// `BINARY` / `VARBINARY`.
    Binary,
    /// A type this layer does not classify (e.g. `GEOGRAPHY`).
    Other,
}

const NUMBER_ALIASES: &[&str] = &[
    "NUMBER", "DECIMAL", "NUMERIC", "DEC", "FIXED", "INT", "INTEGER", "BIGINT", "SMALLINT",
    "TINYINT", "BYTEINT", "DECFLOAT",
];

impl SqlType {
    /// Classify an uppercased type tag with any `(..)` suffix removed.
    #[must_use]
    pub fn from_base_name(base: &str) -> Self {
        match base {
            "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMESTAMP" | "DATETIME" => Self::Timestamp(TimestampFlavor::Plain),
            "TIMESTAMP_LTZ" | "TIMESTAMPLTZ" | "TIMESTAMP WITH LOCAL TIME ZONE" => {
                Self::Timestamp(TimestampFlavor::Ltz)
            }
            "TIMESTAMP_NTZ" | "TIMESTAMPNTZ" | "TIMESTAMP WITHOUT TIME ZONE" => {
                Self::Timestamp(TimestampFlavor::Ntz)
            }
            "TIMESTAMP_TZ" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
                Self::Timestamp(TimestampFlavor::Tz)
            }
            "ARRAY" => Self::Array,
            "VARIANT" => Self::Variant,
            "OBJECT" | "MAP" => Self::Object,
            "REAL" => Self::Real,
            _ if base.starts_with("FLOAT") || base.starts_with("DOUBLE") => Self::Real,
            _ if NUMBER_ALIASES.contains(&base) => Self::Number,
            "BINARY" | "VARBINARY" => Self::Binary,
            "STRING" | "TEXT" => Self::Text,
            _ if base.contains("CHAR") => Self::Text,
            _ => Self::Other,
        }
    }

    /// True for families that carry a fractional-second scale.
    #[must_use]
    pub const fn is_temporal_with_scale(self) -> bool {
        matches!(self, Self::Time | Self::Timestamp(_))
    }
}

/// Split `NUMBER(38, 2)` into `("NUMBER", [38, 2])`.
///
/// Unparseable parameters are skipped.
fn parse_type_tag(tag: &str) -> (&str, Vec<u64>) {
    match tag.split_once('(') {
        Some((base, rest)) => {
            let inner = rest.trim_end().trim_end_matches(')');
            let params = inner
                .split(',')
                .filter_map(|p| p.trim().parse().ok())
                .collect();
            (base.trim_end(), params)
        }
        None => (tag, Vec::new()),
    }
}

/// Metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    name: String,
    sql_type: String,
    kind: SqlType,
    nullable: bool,
    scale: Option<u8>,
    precision: Option<u8>,
    length: Option<u64>,
}

impl ColumnDescriptor {
    /// Build from driver metadata.
    ///
    /// Missing scale/precision/length are taken from the type tag. TIME and
    /// TIMESTAMP columns without any scale get 9.
    #[must_use]
    pub fn from_raw(raw: &RawColumn) -> Self {
        let sql_type = raw.type_name.trim().to_ascii_uppercase();
        let (base, params) = parse_type_tag(&sql_type);
        let kind = SqlType::from_base_name(base);
        let param = |i: usize| params.get(i).copied();

        let scale = match kind {
            SqlType::Time | SqlType::Timestamp(_) => Some(
                raw.scale
                    .or_else(|| param(0).map(|p| p.min(u64::from(MAX_SCALE)) as u8))
                    .unwrap_or(MAX_SCALE)
                    .min(MAX_SCALE),
            ),
            SqlType::Number => raw
                .scale
                .or_else(|| param(1).and_then(|p| u8::try_from(p).ok()))
                .or(Some(0)),
            _ => raw.scale,
        };
        let precision = match kind {
            SqlType::Number => raw
                .precision
                .or_else(|| param(0).and_then(|p| u8::try_from(p).ok())),
            _ => raw.precision,
        };
        let length = match kind {
            SqlType::Text | SqlType::Binary => raw.length.or_else(|| param(0)),
            _ => raw.length,
        };

        Self {
            name: raw.name.clone(),
            sql_type,
            kind,
            nullable: raw.nullable,
            scale,
            precision,
            length,
        }
    }

    /// Shorthand for a nullable column with no extra metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::from_raw(&RawColumn::new(name, type_name))
    }

    /// Column name as reported by the server.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type tag, uppercased, e.g. `TIMESTAMP_NTZ(3)`.
    #[must_use]
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    /// Parsed type family.
    #[must_use]
    pub const fn kind(&self) -> SqlType {
        self.kind
    }

    /// Whether NULL is allowed.
    #[must_use]
    pub const fn nullable(&self) -> bool {
        self.nullable
    }

    /// Digits after the decimal point (fractional seconds for TIME/TIMESTAMP).
    #[must_use]
    pub const fn scale(&self) -> Option<u8> {
        self.scale
    }

    /// Total significant digits for NUMBER columns.
    #[must_use]
    pub const fn precision(&self) -> Option<u8> {
        self.precision
    }

    /// Maximum length of character and binary columns.
    #[must_use]
    pub const fn length(&self) -> Option<u64> {
        self.length
    }

    /// Generic type of the declared SQL type.
    ///
    /// # Errors
    ///
    /// Returns an unsupported type error for types without a mapping.
    pub fn generic_type(&self) -> Result<GenericType> {
        let (base, _) = parse_type_tag(&self.sql_type);
        map_sql_type_to_generic_type(base)
            .map_err(|_| CursorError::unsupported_type(&self.sql_type))
    }

    /// True for character columns.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.kind, SqlType::Text)
    }

    /// True for ARRAY columns.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self.kind, SqlType::Array)
    }

    /// True for binary columns.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self.kind, SqlType::Binary)
    }

    /// True for BOOLEAN columns.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        matches!(self.kind, SqlType::Boolean)
    }

    /// True for DATE columns.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self.kind, SqlType::Date)
    }

    /// True for NUMBER and its aliases as well as floating point types.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self.kind, SqlType::Number | SqlType::Real)
    }

    /// True for OBJECT columns.
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self.kind, SqlType::Object)
    }

    /// True for TIME columns.
    #[must_use]
    pub const fn is_time(&self) -> bool {
        matches!(self.kind, SqlType::Time)
    }

    /// True for every timestamp flavor.
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(self.kind, SqlType::Timestamp(_))
    }

    /// True for VARIANT columns.
    #[must_use]
    pub const fn is_variant(&self) -> bool {
        matches!(self.kind, SqlType::Variant)
    }
}

/// A column addressed by 0-based index or by name.
///
/// Name lookup tries an exact match first, then an ASCII case-insensitive
/// one; the first column in server order wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// 0-based position in server order.
    Index(usize),
    /// Column name.
    Name(String),
}

impl ColumnRef {
    /// Resolve against `columns`, returning the 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an unknown column error when nothing matches.
    pub fn resolve(&self, columns: &[ColumnDescriptor]) -> Result<usize> {
        match self {
            Self::Index(index) if *index < columns.len() => Ok(*index),
            Self::Index(index) => Err(CursorError::unknown_column(format!(
                "index {index} (result has {} columns)",
                columns.len()
            ))),
            Self::Name(name) => columns
                .iter()
                .position(|c| c.name == *name)
                .or_else(|| {
                    columns
                        .iter()
                        .position(|c| c.name.eq_ignore_ascii_case(name))
                })
                .ok_or_else(|| CursorError::unknown_column(name.clone())),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for ColumnRef {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicates(c: &ColumnDescriptor) -> [bool; 10] {
        [
            c.is_text(),
            c.is_array(),
            c.is_binary(),
            c.is_boolean(),
            c.is_date(),
            c.is_number(),
            c.is_object(),
            c.is_time(),
            c.is_timestamp(),
            c.is_variant(),
        ]
    }

    #[test]
    fn test_exactly_one_predicate_for_known_families() {
        for t in [
            "VARCHAR(16777216)",
            "ARRAY",
            "BINARY(8388608)",
            "BOOLEAN",
            "DATE",
            "NUMBER(38,0)",
            "FLOAT",
            "OBJECT",
            "TIME(9)",
            "TIMESTAMP_LTZ(9)",
            "TIMESTAMP_NTZ",
            "TIMESTAMP_TZ(3)",
            "VARIANT",
        ] {
            let col = ColumnDescriptor::new("C", t);
            let hits = predicates(&col).iter().filter(|p| **p).count();
            assert_eq!(hits, 1, "{t}");
        }
    }

    #[test]
    fn test_oversized_tag_parameters_are_dropped() {
        let col = ColumnDescriptor::new("N", "NUMBER(300,2)");
        assert_eq!(col.precision(), None);
        assert_eq!(col.scale(), Some(2));

        let col = ColumnDescriptor::new("N", "NUMBER(38,256)");
        assert_eq!(col.precision(), Some(38));
        assert_eq!(col.scale(), Some(0));
    }

    #[test]
    fn test_generic_type_ignores_tag_parameters() {
        let time = ColumnDescriptor::new("T", "TIME(9)");
        assert!(time.is_time());
        assert_eq!(time.generic_type().unwrap(), GenericType::Text);

        let err = ColumnDescriptor::new("G", "GEOGRAPHY(4326)").generic_type().unwrap_err();
        assert_eq!(err.unsupported_type_name(), Some("GEOGRAPHY(4326)"));
    }

    #[test]
    fn test_array_and_variant_are_distinct() {
        let array = ColumnDescriptor::new("A", "ARRAY");
        let variant = ColumnDescriptor::new("V", "VARIANT");
        assert!(array.is_array() && !array.is_variant());
        assert!(variant.is_variant() && !variant.is_array());
        assert_eq!(array.generic_type().unwrap(), variant.generic_type().unwrap());
    }

    #[test]
    fn test_unclassified_type_has_no_predicate() {
        let col = ColumnDescriptor::new("G", "GEOGRAPHY");
        assert_eq!(col.kind(), SqlType::Other);
        assert!(predicates(&col).iter().all(|p| !p));
        assert!(col.generic_type().unwrap_err().is_unsupported_type());
    }

    #[test]
    fn test_timestamp_flavors() {
        assert_eq!(
            ColumnDescriptor::new("T", "timestamp_tz(3)").kind(),
            SqlType::Timestamp(TimestampFlavor::Tz)
        );
        assert_eq!(
            ColumnDescriptor::new("T", "DATETIME").kind(),
            SqlType::Timestamp(TimestampFlavor::Plain)
        );
        assert_eq!(
            ColumnDescriptor::new("T", "TIMESTAMP WITHOUT TIME ZONE").kind(),
            SqlType::Timestamp(TimestampFlavor::Ntz)
        );
    }

    #[test]
    fn test_scale_from_tag_and_defaults() {
        assert_eq!(ColumnDescriptor::new("T", "TIMESTAMP_NTZ(3)").scale(), Some(3));
        assert_eq!(ColumnDescriptor::new("T", "TIMESTAMP_NTZ").scale(), Some(9));
        assert_eq!(ColumnDescriptor::new("T", "TIME").scale(), Some(9));
        assert_eq!(ColumnDescriptor::new("N", "NUMBER(10,2)").scale(), Some(2));
        assert_eq!(ColumnDescriptor::new("N", "NUMBER(10,2)").precision(), Some(10));
        assert_eq!(ColumnDescriptor::new("N", "INTEGER").scale(), Some(0));
        assert_eq!(ColumnDescriptor::new("S", "VARCHAR(16)").length(), Some(16));
        assert_eq!(ColumnDescriptor::new("S", "VARCHAR(16)").scale(), None);
    }

    #[test]
    fn test_driver_scale_wins_over_tag() {
        let raw = RawColumn::new("T", "TIMESTAMP_NTZ(9)").scale(6).nullable(false);
        let col = ColumnDescriptor::from_raw(&raw);
        assert_eq!(col.scale(), Some(6));
        assert!(!col.nullable());
        assert_eq!(col.sql_type(), "TIMESTAMP_NTZ(9)");
    }

    #[test]
    fn test_resolve_by_index() {
        let cols = vec![ColumnDescriptor::new("A", "TEXT"), ColumnDescriptor::new("B", "DATE")];
        assert_eq!(ColumnRef::from(1).resolve(&cols).unwrap(), 1);
        assert!(ColumnRef::from(2).resolve(&cols).unwrap_err().is_unknown_column());
    }

    #[test]
    fn test_resolve_by_name_prefers_exact_match() {
        let cols = vec![
            ColumnDescriptor::new("id", "NUMBER"),
            ColumnDescriptor::new("ID", "NUMBER"),
            ColumnDescriptor::new("NAME", "TEXT"),
        ];
        assert_eq!(ColumnRef::from("ID").resolve(&cols).unwrap(), 1);
        assert_eq!(ColumnRef::from("name").resolve(&cols).unwrap(), 2);
        let err = ColumnRef::from("missing").resolve(&cols).unwrap_err();
        assert!(err.is_unknown_column());
        assert!(err.to_string().contains("missing"));
    }
}
