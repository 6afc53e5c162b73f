//! Logging initialisation and optional counters.
//!
//! Counters are recorded through the `metrics` facade when the `metrics`
//! feature is enabled; installing an exporter is left to the application.

use crate::config::LoggingConfig;
use crate::error::{CursorError, Result};

#[cfg(feature = "metrics")]
const METRIC_STATEMENTS: &str = "sfcursor_statements_executed_total";
#[cfg(feature = "metrics")]
const METRIC_ROWS: &str = "sfcursor_rows_received_total";
#[cfg(feature = "metrics")]
const METRIC_STREAM_FAILURES: &str = "sfcursor_stream_failures_total";

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a global
/// subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CursorError::config(format!("failed to install log subscriber: {e}")))
}

/// Register counter descriptions with the installed recorder.
#[cfg(feature = "metrics")]
pub fn describe_metrics() {
    use metrics::describe_counter;

    describe_counter!(METRIC_STATEMENTS, "Statements submitted to the driver");
    describe_counter!(METRIC_ROWS, "Rows received from driver streams");
    describe_counter!(METRIC_STREAM_FAILURES, "Row streams that ended in failure");
}

#[cfg(feature = "metrics")]
pub(crate) fn record_statement() {
    metrics::counter!(METRIC_STATEMENTS).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) const fn record_statement() {}

#[cfg(feature = "metrics")]
pub(crate) fn record_row_received() {
    metrics::counter!(METRIC_ROWS).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) const fn record_row_received() {}

#[cfg(feature = "metrics")]
pub(crate) fn record_stream_failure() {
    metrics::counter!(METRIC_STREAM_FAILURES).increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(crate) const fn record_stream_failure() {}
