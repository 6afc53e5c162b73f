//! Entry point: a driver session plus cursor configuration.

use std::sync::Arc;

use crate::config::CursorConfig;
use crate::driver::{Driver, Query};
use crate::error::Result;
use crate::result_set::ResultSet;
use crate::statement::Statement;

/// Factory for statements over one driver session.
///
/// Cloning is cheap; clones share the driver and configuration.
#[derive(Debug, Clone)]
pub struct Connection {
    driver: Arc<dyn Driver>,
    config: Arc<CursorConfig>,
}

impl Connection {
    /// Wrap a driver with the default configuration.
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::with_config(driver, CursorConfig::default())
    }

    /// Wrap a driver with an explicit configuration.
    pub fn with_config(driver: impl Driver + 'static, config: CursorConfig) -> Self {
        Self::from_shared(Arc::new(driver), config)
    }

    /// Use a driver that is shared with other owners.
    #[must_use]
    pub fn from_shared(driver: Arc<dyn Driver>, config: CursorConfig) -> Self {
        Self {
            driver,
            config: Arc::new(config),
        }
    }

    /// Cursor configuration applied to every statement.
    #[must_use]
    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// A statement for `query`; nothing is sent until it is executed.
    pub fn create_statement(&self, query: impl Into<Query>) -> Statement {
        Statement::new(
            Arc::clone(&self.driver),
            query.into(),
            Arc::clone(&self.config),
        )
    }

    /// Create a statement, execute it, and return its result set.
    ///
    /// The server cursor is released when the result set is dropped or
    /// closed.
    pub fn execute(&self, query: impl Into<Query>) -> Result<ResultSet> {
        self.create_statement(query).execute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CursorMode;
    use crate::driver::{MemoryDriver, RawCell, RawColumn, ScriptedResult};

    fn driver() -> MemoryDriver {
        let driver = MemoryDriver::new();
        driver.script(
            "SELECT CURRENT_VERSION()",
            ScriptedResult::new(vec![RawColumn::new("CURRENT_VERSION()", "VARCHAR")])
                .row(vec![RawCell::Text("8.40.1".into())]),
        );
        driver
    }

    #[test]
    fn test_execute_shortcut() {
        let conn = Connection::new(driver());
        let mut rs = conn.execute("SELECT CURRENT_VERSION()").unwrap();
        assert!(rs.next().unwrap());
        assert_eq!(rs.column_value_as_string(0).unwrap(), "8.40.1");
        assert!(!rs.next().unwrap());
    }

    #[test]
    fn test_statements_share_config() {
        let config = CursorConfig::builder()
            .mode(CursorMode::Buffered)
            .build()
            .unwrap();
        let conn = Connection::with_config(driver(), config);
        let clone = conn.clone();
        assert_eq!(clone.config().mode, CursorMode::Buffered);

        let stmt = clone.create_statement(String::from("SELECT CURRENT_VERSION()"));
        assert!(!stmt.is_executed());
        assert_eq!(stmt.sql_text(), "SELECT CURRENT_VERSION()");
    }

    #[test]
    fn test_execute_unknown_sql() {
        let conn = Connection::new(driver());
        assert!(conn.execute("SELECT 1").unwrap_err().is_driver_error());
    }
}
