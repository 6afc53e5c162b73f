//! In-process scripted driver.
//!
//! [`MemoryDriver`] answers queries from results registered up front, keyed by
//! SQL text. Rows are pushed from a producer thread so the consumer sees the
//! same interleaving a network driver would produce.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Driver, DriverError, DriverResult, ExecutedStatement, Query, RawCell, RawColumn, Row};
use crate::stream::RowSink;

/// Server code reported for SQL with no scripted result.
pub const NO_SUCH_OBJECT_CODE: &str = "002003";

/// A canned result for one SQL text.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResult {
    columns: Vec<RawColumn>,
    rows: Vec<Row>,
    announce_row_count: bool,
    failure: Option<(usize, String)>,
    row_delay: Option<Duration>,
}

impl ScriptedResult {
    /// A result with the given columns, no rows and an eagerly known count.
    #[must_use]
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            announce_row_count: true,
            failure: None,
            row_delay: None,
        }
    }

    /// Append one row.
    #[must_use]
    pub fn row(mut self, cells: Vec<RawCell>) -> Self {
        self.rows.push(Row::new(cells));
        self
    }

    /// Append several rows.
    #[must_use]
    pub fn rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<RawCell>>,
    {
        self.rows.extend(rows.into_iter().map(Row::new));
        self
    }

    /// Whether `row_count()` reports the total before streaming starts.
    #[must_use]
    pub const fn announce_row_count(mut self, announce: bool) -> Self {
        self.announce_row_count = announce;
        self
    }

    /// Fail the stream after `delivered` rows with `message`.
    #[must_use]
    pub fn fail_after(mut self, delivered: usize, message: impl Into<String>) -> Self {
        self.failure = Some((delivered, message.into()));
        self
    }

    /// Sleep before pushing each row.
    #[must_use]
    pub const fn row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = Some(delay);
        self
    }

    /// Scripted column metadata.
    #[must_use]
    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    /// Number of scripted rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Driver that serves [`ScriptedResult`]s.
///
/// # Example
///
/// ```rust
/// use sfcursor::driver::{MemoryDriver, RawCell, RawColumn, ScriptedResult};
///
/// let driver = MemoryDriver::new();
/// driver.script(
///     "SELECT 1",
///     ScriptedResult::new(vec![RawColumn::new("1", "NUMBER(1,0)")])
///         .row(vec![RawCell::Integer(1)]),
/// );
/// assert_eq!(driver.scripted_queries(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryDriver {
    scripts: Mutex<HashMap<String, ScriptedResult>>,
    submitted: Mutex<Vec<Query>>,
    next_query: AtomicU64,
    released: Arc<AtomicUsize>,
}

impl MemoryDriver {
    /// An empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the result returned for `sql_text`.
    ///
    /// The text is matched after trimming surrounding whitespace.
    pub fn script(&self, sql_text: impl Into<String>, result: ScriptedResult) -> &Self {
        let key = sql_text.into().trim().to_string();
        self.scripts.lock().insert(key, result);
        self
    }

    /// Number of registered SQL texts.
    #[must_use]
    pub fn scripted_queries(&self) -> usize {
        self.scripts.lock().len()
    }

    /// Every query submitted so far, in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<Query> {
        self.submitted.lock().clone()
    }

    /// Number of statement handles released through `close()`.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Acquire)
    }
}

impl Driver for MemoryDriver {
    fn submit(&self, query: &Query) -> DriverResult<Box<dyn ExecutedStatement>> {
        self.submitted.lock().push(query.clone());

        let key = query.sql_text().trim();
        let script = self.scripts.lock().get(key).cloned().ok_or_else(|| {
            DriverError::new(format!(
                "SQL compilation error: no result registered for '{key}'"
            ))
            .with_code(NO_SUCH_OBJECT_CODE)
        })?;

        let seq = self.next_query.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Box::new(MemoryStatement {
            query_id: format!("01b00000-0000-4000-8000-{seq:012x}"),
            sql_text: query.sql_text().to_string(),
            script,
            cancelled: Arc::new(AtomicBool::new(false)),
            released: Arc::clone(&self.released),
            closed: false,
        }))
    }
}

#[derive(Debug)]
struct MemoryStatement {
    query_id: String,
    sql_text: String,
    script: ScriptedResult,
    cancelled: Arc<AtomicBool>,
    released: Arc<AtomicUsize>,
    closed: bool,
}

impl ExecutedStatement for MemoryStatement {
    fn query_id(&self) -> &str {
        &self.query_id
    }

    fn sql_text(&self) -> &str {
        &self.sql_text
    }

    fn columns(&self) -> &[RawColumn] {
        &self.script.columns
    }

    fn row_count(&self) -> Option<u64> {
        self.script
            .announce_row_count
            .then_some(self.script.rows.len() as u64)
    }

    fn stream_rows(&mut self, sink: RowSink) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::new("statement handle already closed"));
        }

        let script = self.script.clone();
        let cancelled = Arc::clone(&self.cancelled);
        thread::Builder::new()
            .name(format!("sfcursor-memory-{}", self.query_id))
            .spawn(move || produce(script, &cancelled, sink))
            .map_err(|e| DriverError::new(format!("failed to start row producer: {e}")))?;
        Ok(())
    }

    fn close(&mut self) -> DriverResult<()> {
        self.cancelled.store(true, Ordering::Release);
        if !self.closed {
            self.closed = true;
            self.released.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }
}

fn produce(script: ScriptedResult, cancelled: &AtomicBool, mut sink: RowSink) {
    for (index, row) in script.rows.into_iter().enumerate() {
        if let Some((after, message)) = &script.failure
            && index == *after
        {
            sink.fail(message.clone());
            return;
        }
        if let Some(delay) = script.row_delay {
            thread::sleep(delay);
        }
        if cancelled.load(Ordering::Acquire) {
            sink.fail("statement closed while streaming");
            return;
        }
        if sink.push(row).is_err() {
            return;
        }
    }

    match script.failure {
        Some((_, message)) => sink.fail(message),
        None => sink.complete(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{RowWait, channel};

    fn two_rows() -> ScriptedResult {
        ScriptedResult::new(vec![RawColumn::new("N", "NUMBER(38,0)")])
            .rows([vec![RawCell::Integer(1)], vec![RawCell::Integer(2)]])
    }

    #[test]
    fn test_unscripted_query_is_rejected() {
        let driver = MemoryDriver::new();
        let err = driver.submit(&Query::new("SELECT * FROM MISSING")).unwrap_err();
        assert_eq!(err.code(), Some(NO_SUCH_OBJECT_CODE));
        assert_eq!(driver.submitted().len(), 1);
    }

    #[test]
    fn test_each_submission_gets_a_new_query_id() {
        let driver = MemoryDriver::new();
        driver.script("SELECT N FROM T", two_rows());

        let first = driver.submit(&"SELECT N FROM T".into()).unwrap();
        let second = driver.submit(&" SELECT N FROM T ".into()).unwrap();
        assert_ne!(first.query_id(), second.query_id());
        assert_eq!(first.row_count(), Some(2));
    }

    #[test]
    fn test_streams_scripted_rows() {
        let driver = MemoryDriver::new();
        driver.script("SELECT N FROM T", two_rows().announce_row_count(false));

        let mut handle = driver.submit(&"SELECT N FROM T".into()).unwrap();
        assert_eq!(handle.row_count(), None);

        let (sink, rx) = channel(1, None, None);
        handle.stream_rows(sink).unwrap();
        assert_eq!(rx.wait_until_settled(None).unwrap(), Some(2));
    }

    #[test]
    fn test_injected_failure() {
        let driver = MemoryDriver::new();
        driver.script(
            "SELECT N FROM T",
            two_rows().fail_after(1, "connection reset"),
        );

        let mut handle = driver.submit(&"SELECT N FROM T".into()).unwrap();
        let (sink, rx) = channel(1, handle.row_count(), None);
        handle.stream_rows(sink).unwrap();

        assert!(matches!(rx.wait_for_row(0, None), RowWait::Ready(_)));
        assert!(matches!(rx.wait_for_row(1, None), RowWait::Failed(_)));
    }

    #[test]
    fn test_close_is_counted_once() {
        let driver = MemoryDriver::new();
        driver.script("SELECT N FROM T", two_rows());

        let mut handle = driver.submit(&"SELECT N FROM T".into()).unwrap();
        handle.close().unwrap();
        handle.close().unwrap();
        assert_eq!(driver.released(), 1);
    }
}
