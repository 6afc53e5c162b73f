//! TOML configuration file loading

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::builder::{CursorConfigBuilder, CursorMode};
use crate::Result;
use crate::error::CursorError;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./sfcursor.toml",
    "~/.config/sfcursor/config.toml",
    "/etc/sfcursor/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: CursorConfigBuilder) -> Result<CursorConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CursorError::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        CursorError::config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(apply_file_config(builder, file_config))
}

fn apply_file_config(mut builder: CursorConfigBuilder, config: FileConfig) -> CursorConfigBuilder {
    if let Some(cursor) = config.cursor {
        if let Some(mode_str) = cursor.mode {
            builder = builder.mode(CursorMode::parse_or_default(&mode_str, "cursor.mode"));
        }

        if let Some(rows) = cursor.prefetch_rows {
            builder = builder.prefetch_rows(NonZeroUsize::new(rows));
        }

        if let Some(millis) = cursor.row_wait_timeout_ms {
            builder = builder.row_wait_timeout((millis > 0).then(|| Duration::from_millis(millis)));
        }

        if let Some(null) = cursor.null_string {
            builder = builder.null_string(null);
        }
    }

    if let Some(logging) = config.logging {
        if let Some(level) = logging.level {
            builder = builder.log_level(level);
        }

        if let Some(json) = logging.json {
            builder = builder.json_logs(json);
        }
    }

    builder
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    cursor: Option<CursorFileConfig>,
    logging: Option<LoggingFileConfig>,
}

#[derive(Debug, Deserialize)]
struct CursorFileConfig {
    mode: Option<String>,
    prefetch_rows: Option<usize>,
    row_wait_timeout_ms: Option<u64>,
    null_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggingFileConfig {
    level: Option<String>,
    json: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(
            r#"
[cursor]
mode = "buffered"
prefetch_rows = 500
row_wait_timeout_ms = 2000
null_string = "NULL"

[logging]
level = "debug"
json = true
"#,
        );

        let config = load_from_file(file.path(), CursorConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.mode, CursorMode::Buffered);
        assert_eq!(config.prefetch_rows, NonZeroUsize::new(500));
        assert_eq!(config.row_wait_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.null_string, "NULL");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_empty_file_keeps_defaults() {
        let file = create_temp_config("");
        let config = load_from_file(file.path(), CursorConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.mode, CursorMode::Streaming);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        let file = create_temp_config("[cursor\nmode = ");
        let err = load_from_file(file.path(), CursorConfigBuilder::new()).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_wrong_value_type() {
        let file = create_temp_config("[cursor]\nprefetch_rows = \"lots\"\n");
        assert!(load_from_file(file.path(), CursorConfigBuilder::new()).is_err());
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let file = create_temp_config("[cursor]\nrow_wait_timeout_ms = 0\n");
        let config = load_from_file(file.path(), CursorConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.row_wait_timeout, None);
    }
}
