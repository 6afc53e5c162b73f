//! Typed statements and streaming result-set cursors over an analytical
//! database driver.
//!
//! A [`Connection`] wraps a [`Driver`]. Executing a [`Statement`] submits the
//! query, captures its column metadata, and starts a row stream that fills a
//! bounded buffer in the background while a [`ResultSet`] reads it through a
//! forward-only cursor.
//!
//! # Features
//!
//! - Column metadata with type predicates and generic type mapping
//! - Nanosecond timestamps with scale-aware rendering
//! - Streaming or fully buffered result sets
//! - Server cursors released exactly once, on close or drop
//! - `async` (default): feed a row sink from an async stream
//! - `metrics`: counters through the `metrics` facade
//!
//! # Example
//!
//! ```rust
//! use sfcursor::Connection;
//! use sfcursor::driver::{MemoryDriver, RawCell, RawColumn, ScriptedResult};
//!
//! let driver = MemoryDriver::new();
//! driver.script(
//!     "SELECT ID, NAME FROM USERS",
//!     ScriptedResult::new(vec![
//!         RawColumn::new("ID", "NUMBER(38,0)"),
//!         RawColumn::new("NAME", "VARCHAR"),
//!     ])
//!     .row(vec![RawCell::Integer(1), RawCell::Text("Ada".into())])
//!     .row(vec![RawCell::Integer(2), RawCell::Text("Grace".into())]),
//! );
//!
//! let conn = Connection::new(driver);
//! let mut rs = conn.execute("SELECT ID, NAME FROM USERS").unwrap();
//! let mut names = Vec::new();
//! while rs.next().unwrap() {
//!     names.push(rs.get::<String>("NAME").unwrap());
//! }
//! assert_eq!(names, ["Ada", "Grace"]);
//! ```
#![warn(missing_docs)]

pub mod column;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod observability;
pub mod result_set;
pub mod statement;
pub mod stream;
pub mod timestamp;
pub mod types;

pub use column::{ColumnDescriptor, ColumnRef, SqlType, TimestampFlavor};
pub use config::{CursorConfig, CursorConfigBuilder, CursorMode, LoggingConfig};
pub use connection::Connection;
pub use driver::{Driver, MemoryDriver, Query, ScriptedResult};
pub use error::{CursorError, Result};
pub use result_set::ResultSet;
pub use statement::{Statement, StatementMetadata};
pub use timestamp::HighPrecisionTimestamp;
pub use types::{FromValue, GenericType, Value, map_sql_type_to_generic_type};
