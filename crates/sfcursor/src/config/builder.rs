//! Configuration builder

use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CursorError;

/// Cursor layer configuration
#[derive(Debug, Clone)]
pub struct CursorConfig {
    /// Streaming or buffered consumption.
    pub mode: CursorMode,
    /// Rows the producer may buffer past the consumer; `None` is unbounded.
    pub prefetch_rows: Option<NonZeroUsize>,
    /// Bound on each wait for a row; `None` waits indefinitely.
    pub row_wait_timeout: Option<Duration>,
    /// Rendering of NULL cells in `column_value_as_string`.
    pub null_string: String,
    /// Log subscriber settings.
    pub logging: LoggingConfig,
}

impl CursorConfig {
    /// Start a builder with default settings.
    #[must_use]
    pub const fn builder() -> CursorConfigBuilder {
        CursorConfigBuilder::new()
    }

    /// Row consumption mode.
    #[must_use]
    pub const fn mode(&self) -> CursorMode {
        self.mode
    }

    /// Prefetch window size.
    #[must_use]
    pub const fn prefetch_rows(&self) -> Option<NonZeroUsize> {
        self.prefetch_rows
    }

    /// Bound on each row wait.
    #[must_use]
    pub const fn row_wait_timeout(&self) -> Option<Duration> {
        self.row_wait_timeout
    }

    /// Rendering of NULL cells.
    #[must_use]
    pub fn null_string(&self) -> &str {
        &self.null_string
    }

    /// Log subscriber settings.
    #[must_use]
    pub const fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            mode: CursorMode::default(),
            prefetch_rows: None,
            row_wait_timeout: None,
            null_string: String::new(),
            logging: LoggingConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
                json: false,
            },
        }
    }
}

/// How a result set consumes its row stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// `next()` may run while rows are still arriving.
    #[default]
    Streaming,
    /// `execute()` drains the stream before returning the result set.
    Buffered,
}

impl CursorMode {
    /// Parse a configured mode; unrecognised values fall back to streaming
    /// with a warning.
    pub(super) fn parse_or_default(value: &str, source: &str) -> Self {
        value.parse().unwrap_or_else(|err: CursorError| {
            tracing::warn!(source, value, error = %err, "falling back to streaming mode");
            Self::default()
        })
    }
}

impl FromStr for CursorMode {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "streaming" | "stream" => Ok(Self::Streaming),
            "buffered" | "buffer" => Ok(Self::Buffered),
            other => Err(CursorError::config(format!("unknown cursor mode: {other}"))),
        }
    }
}

const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of plain text.
    pub json: bool,
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct CursorConfigBuilder {
    mode: CursorMode,
    prefetch_rows: Option<NonZeroUsize>,
    row_wait_timeout: Option<Duration>,
    null_string: String,
    logging: LoggingConfig,
}

impl CursorConfigBuilder {
    /// A builder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: CursorMode::Streaming,
            prefetch_rows: None,
            row_wait_timeout: None,
            null_string: String::new(),
            logging: LoggingConfig {
                level: String::new(),
                json: false,
            },
        }
    }

    /// Row consumption mode.
    #[must_use]
    pub const fn mode(mut self, mode: CursorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Rows the producer may buffer ahead of the consumer; `None` is unbounded.
    #[must_use]
    pub const fn prefetch_rows(mut self, rows: Option<NonZeroUsize>) -> Self {
        self.prefetch_rows = rows;
        self
    }

    /// Bound on each wait for a row; `None` waits indefinitely.
    #[must_use]
    pub const fn row_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.row_wait_timeout = timeout;
        self
    }

    /// Text rendered for NULL cells.
    #[must_use]
    pub fn null_string(mut self, null: impl Into<String>) -> Self {
        self.null_string = null.into();
        self
    }

    /// Default log filter directive.
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Emit JSON log lines.
    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.logging.json = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<CursorConfig> {
        if self.row_wait_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CursorError::config(
                "row_wait_timeout must be greater than zero",
            ));
        }

        let level = if self.logging.level.is_empty() {
            DEFAULT_LOG_LEVEL.to_string()
        } else {
            self.logging.level
        };

        Ok(CursorConfig {
            mode: self.mode,
            prefetch_rows: self.prefetch_rows,
            row_wait_timeout: self.row_wait_timeout,
            null_string: self.null_string,
            logging: LoggingConfig {
                level,
                json: self.logging.json,
            },
        })
    }
}

impl Default for CursorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = CursorConfigBuilder::new().build().unwrap();
        assert_eq!(config.mode, CursorMode::Streaming);
        assert_eq!(config.prefetch_rows, None);
        assert_eq!(config.row_wait_timeout, None);
        assert_eq!(config.null_string, "");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_default_matches_builder() {
        let built = CursorConfig::builder().build().unwrap();
        let default = CursorConfig::default();
        assert_eq!(built.mode, default.mode);
        assert_eq!(built.logging, default.logging);
        assert_eq!(built.null_string, default.null_string);
    }

    #[test]
    fn test_builder_setters() {
        let config = CursorConfigBuilder::new()
            .mode(CursorMode::Buffered)
            .prefetch_rows(NonZeroUsize::new(64))
            .row_wait_timeout(Some(Duration::from_millis(500)))
            .null_string("NULL")
            .log_level("debug")
            .json_logs(true)
            .build()
            .unwrap();

        assert_eq!(config.mode(), CursorMode::Buffered);
        assert_eq!(config.prefetch_rows().map(NonZeroUsize::get), Some(64));
        assert_eq!(config.row_wait_timeout(), Some(Duration::from_millis(500)));
        assert_eq!(config.null_string(), "NULL");
        assert_eq!(config.logging().level, "debug");
        assert!(config.logging().json);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = CursorConfigBuilder::new()
            .row_wait_timeout(Some(Duration::ZERO))
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_cursor_mode_parsing() {
        assert_eq!("buffered".parse::<CursorMode>().unwrap(), CursorMode::Buffered);
        assert_eq!("BUFFER".parse::<CursorMode>().unwrap(), CursorMode::Buffered);
        assert_eq!("streaming".parse::<CursorMode>().unwrap(), CursorMode::Streaming);
        assert!("bufered".parse::<CursorMode>().unwrap_err().is_config());
    }

    #[test]
    fn test_unrecognised_mode_falls_back_to_streaming() {
        assert_eq!(
            CursorMode::parse_or_default("bufered", "SFCURSOR_MODE"),
            CursorMode::Streaming
        );
        assert_eq!(
            CursorMode::parse_or_default(" Buffered ", "SFCURSOR_MODE"),
            CursorMode::Buffered
        );
    }
}
