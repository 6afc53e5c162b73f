//! Cell values, typed extraction and SQL type mapping.

pub mod convert;
pub mod mapping;
pub mod temporal;
pub mod value;

pub use convert::FromValue;
pub use mapping::{GenericType, map_sql_type_to_generic_type};
pub use value::Value;
