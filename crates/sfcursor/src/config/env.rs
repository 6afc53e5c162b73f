//! Environment variable loading for configuration

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use super::builder::{CursorConfigBuilder, CursorMode};
use crate::Result;
use crate::error::CursorError;

/// Environment variable names
mod vars {
    pub const SFCURSOR_MODE: &str = "SFCURSOR_MODE";
    pub const SFCURSOR_PREFETCH_ROWS: &str = "SFCURSOR_PREFETCH_ROWS";
    pub const SFCURSOR_ROW_WAIT_TIMEOUT_MS: &str = "SFCURSOR_ROW_WAIT_TIMEOUT_MS";
    pub const SFCURSOR_NULL_STRING: &str = "SFCURSOR_NULL_STRING";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const SFCURSOR_JSON_LOGS: &str = "SFCURSOR_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: CursorConfigBuilder) -> Result<CursorConfigBuilder> {
    if let Ok(mode) = env::var(vars::SFCURSOR_MODE) {
        builder = builder.mode(CursorMode::parse_or_default(&mode, vars::SFCURSOR_MODE));
    }

    // 0 lifts the bound
    if let Ok(rows_str) = env::var(vars::SFCURSOR_PREFETCH_ROWS) {
        let rows = rows_str.trim().parse::<usize>().map_err(|e| {
            CursorError::config(format!("Invalid {}: {e}", vars::SFCURSOR_PREFETCH_ROWS))
        })?;
        builder = builder.prefetch_rows(NonZeroUsize::new(rows));
    }

    if let Ok(timeout_str) = env::var(vars::SFCURSOR_ROW_WAIT_TIMEOUT_MS) {
        let millis = timeout_str.trim().parse::<u64>().map_err(|e| {
            CursorError::config(format!(
                "Invalid {}: {e}",
                vars::SFCURSOR_ROW_WAIT_TIMEOUT_MS
            ))
        })?;
        let timeout = (millis > 0).then(|| Duration::from_millis(millis));
        builder = builder.row_wait_timeout(timeout);
    }

    if let Ok(null) = env::var(vars::SFCURSOR_NULL_STRING) {
        builder = builder.null_string(null);
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::SFCURSOR_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
pub(super) mod tests {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Run `f` with every variable this module reads cleared.
    pub(in crate::config) fn with_env_lock<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        clear_env_vars(
            &[
                vars::SFCURSOR_MODE,
                vars::SFCURSOR_PREFETCH_ROWS,
                vars::SFCURSOR_ROW_WAIT_TIMEOUT_MS,
                vars::SFCURSOR_NULL_STRING,
                vars::RUST_LOG,
                vars::SFCURSOR_JSON_LOGS,
            ],
            f,
        )
    }

    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);

        let old_values: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (key, value) in vars {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::set_var(key, value) };
        }

        let result = f();

        for (key, old_value) in old_values {
            match old_value {
                // SAFETY: We hold a mutex lock to ensure no concurrent modifications
                Some(v) => unsafe { env::set_var(key, v) },
                None => unsafe { env::remove_var(key) },
            }
        }

        result
    }

    fn clear_env_vars<F, R>(vars: &[&str], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);

        let old_values: Vec<_> = vars.iter().map(|k| (*k, env::var(k).ok())).collect();

        for key in vars {
            // SAFETY: We hold a mutex lock to ensure no concurrent modifications
            unsafe { env::remove_var(key) };
        }

        let result = f();

        for (key, old_value) in old_values {
            if let Some(v) = old_value {
                // SAFETY: We hold a mutex lock to ensure no concurrent modifications
                unsafe { env::set_var(key, v) };
            }
        }

        result
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_empty_env_keeps_defaults() {
        let config = with_env_lock(|| load_from_env(CursorConfigBuilder::new()))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.mode, CursorMode::Streaming);
        assert_eq!(config.prefetch_rows, None);
    }

    #[test]
    fn test_misspelled_mode_keeps_streaming() {
        with_env_vars(&[("SFCURSOR_MODE", "bufered")], || {
            let config = load_from_env(CursorConfigBuilder::new())
                .unwrap()
                .build()
                .unwrap();
            assert_eq!(config.mode, CursorMode::Streaming);
        });
    }

    #[test]
    fn test_load_mode_and_prefetch() {
        with_env_vars(
            &[("SFCURSOR_MODE", "buffered"), ("SFCURSOR_PREFETCH_ROWS", "256")],
            || {
                let config = load_from_env(CursorConfigBuilder::new())
                    .unwrap()
                    .build()
                    .unwrap();
                assert_eq!(config.mode, CursorMode::Buffered);
                assert_eq!(config.prefetch_rows, NonZeroUsize::new(256));
            },
        );
    }

    #[test]
    fn test_zero_prefetch_is_unbounded() {
        with_env_vars(&[("SFCURSOR_PREFETCH_ROWS", "0")], || {
            let builder = CursorConfigBuilder::new().prefetch_rows(NonZeroUsize::new(8));
            let config = load_from_env(builder).unwrap().build().unwrap();
            assert_eq!(config.prefetch_rows, None);
        });
    }

    #[test]
    fn test_invalid_prefetch_is_rejected() {
        with_env_vars(&[("SFCURSOR_PREFETCH_ROWS", "many")], || {
            let err = load_from_env(CursorConfigBuilder::new()).unwrap_err();
            assert!(err.is_config());
            assert!(err.to_string().contains("SFCURSOR_PREFETCH_ROWS"));
        });
    }

    #[test]
    fn test_load_timeout_null_string_and_logging() {
        with_env_vars(
            &[
                ("SFCURSOR_ROW_WAIT_TIMEOUT_MS", "1500"),
                ("SFCURSOR_NULL_STRING", "\\N"),
                ("RUST_LOG", "sfcursor=trace"),
                ("SFCURSOR_JSON_LOGS", "yes"),
            ],
            || {
                let config = load_from_env(CursorConfigBuilder::new())
                    .unwrap()
                    .build()
                    .unwrap();
                assert_eq!(config.row_wait_timeout, Some(Duration::from_millis(1500)));
                assert_eq!(config.null_string, "\\N");
                assert_eq!(config.logging.level, "sfcursor=trace");
                assert!(config.logging.json);
            },
        );
    }
}
