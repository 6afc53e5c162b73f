//! Single-producer / single-consumer row hand-off.
//!
//! The driver pushes rows through a [`RowSink`]; the result set reads them
//! through a [`RowReceiver`]. Rows land in an append-only buffer in arrival
//! order and are never mutated afterwards, so readers only clone an `Arc`
//! under the lock. Two condvars coordinate the sides:
//!
//! - `arrived` wakes the consumer when a row lands or the stream settles,
//! - `drained` wakes the producer when the consumer's demand point moves or
//!   the consumer detaches.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::driver::Row;
use crate::error::CursorError;
use crate::observability;

/// The consumer is gone or the stream was already settled; stop producing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("row sink is closed")]
pub struct SinkClosed;

#[derive(Debug, Clone)]
enum StreamStatus {
    Open,
    Complete,
    Failed(CursorError),
}

#[derive(Debug)]
struct BufferState {
    rows: Vec<Arc<Row>>,
    expected: Option<u64>,
    status: StreamStatus,
    /// Number of leading rows the consumer has asked for.
    demand: usize,
    consumer_attached: bool,
}

impl BufferState {
    fn fail(&mut self, err: CursorError) {
        if matches!(self.status, StreamStatus::Open) {
            observability::record_stream_failure();
            self.status = StreamStatus::Failed(err);
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<BufferState>,
    arrived: Condvar,
    drained: Condvar,
    width: usize,
    prefetch: Option<NonZeroUsize>,
}

/// Outcome of waiting for one row.
#[derive(Debug, Clone)]
pub enum RowWait {
    /// The row is buffered.
    Ready(Arc<Row>),
    /// The stream completed before reaching this index.
    Exhausted,
    /// The stream failed before delivering this index.
    Failed(CursorError),
    /// The bounded wait elapsed; the stream is still open.
    TimedOut,
}

/// Create a connected sink/receiver pair.
///
/// * `width` - number of cells every row must carry
/// * `expected` - total row count when the driver announces it up front
/// * `prefetch` - how many rows the producer may buffer past the consumer's
///   demand point before `push` blocks; `None` is unbounded
#[must_use]
pub fn channel(
    width: usize,
    expected: Option<u64>,
    prefetch: Option<NonZeroUsize>,
) -> (RowSink, RowReceiver) {
    let shared = Arc::new(Shared {
        state: Mutex::new(BufferState {
            rows: Vec::new(),
            expected,
            status: StreamStatus::Open,
            demand: 0,
            consumer_attached: true,
        }),
        arrived: Condvar::new(),
        drained: Condvar::new(),
        width,
        prefetch,
    });

    let sink = RowSink {
        shared: Arc::clone(&shared),
        settled: false,
    };
    (sink, RowReceiver { shared })
}

/// Producer half, handed to [`ExecutedStatement::stream_rows`].
///
/// Dropping a sink without calling [`complete`](Self::complete) or
/// [`fail`](Self::fail) fails the stream.
///
/// [`ExecutedStatement::stream_rows`]: crate::driver::ExecutedStatement::stream_rows
#[derive(Debug)]
pub struct RowSink {
    shared: Arc<Shared>,
    settled: bool,
}

impl RowSink {
    /// Append one row, blocking while the prefetch window is full.
    ///
    /// A row whose width differs from the column count fails the stream.
    ///
    /// # Errors
    ///
    /// Returns [`SinkClosed`] when the consumer detached, the stream already
    /// settled, or the row was rejected.
    pub fn push(&mut self, row: Row) -> Result<(), SinkClosed> {
        let mut state = self.shared.state.lock();

        if row.len() != self.shared.width {
            let index = state.rows.len();
            state.fail(CursorError::stream_failure(format!(
                "malformed row {}: expected {} cells, got {}",
                index,
                self.shared.width,
                row.len()
            )));
            self.settled = true;
            self.shared.arrived.notify_all();
            return Err(SinkClosed);
        }

        if let Some(expected) = state.expected
            && state.rows.len() as u64 >= expected
        {
            state.fail(CursorError::stream_failure(format!(
                "driver delivered more than the announced {expected} rows"
            )));
            self.settled = true;
            self.shared.arrived.notify_all();
            return Err(SinkClosed);
        }

        loop {
            if !state.consumer_attached || !matches!(state.status, StreamStatus::Open) {
                return Err(SinkClosed);
            }
            match self.shared.prefetch {
                Some(window) if state.rows.len().saturating_sub(state.demand) >= window.get() => {
                    self.shared.drained.wait(&mut state);
                }
                _ => break,
            }
        }

        state.rows.push(Arc::new(row));
        observability::record_row_received();
        drop(state);
        self.shared.arrived.notify_all();
        Ok(())
    }

    /// Announce the total row count once the driver discovers it.
    ///
    /// Ignored when a count was already announced.
    pub fn announce_row_count(&self, total: u64) {
        let mut state = self.shared.state.lock();
        if state.expected.is_none() {
            state.expected = Some(total);
        }
        drop(state);
        self.shared.arrived.notify_all();
    }

    /// True when further pushes would be rejected.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock();
        !state.consumer_attached || !matches!(state.status, StreamStatus::Open)
    }

    /// Signal that every row has been delivered.
    pub fn complete(mut self) {
        self.settled = true;
        let mut state = self.shared.state.lock();
        if !matches!(state.status, StreamStatus::Open) {
            return;
        }
        let delivered = state.rows.len() as u64;
        match state.expected {
            Some(expected) if delivered < expected => {
                state.fail(CursorError::stream_failure(format!(
                    "stream completed after {delivered} of {expected} rows"
                )));
            }
            _ => {
                state.expected = Some(delivered);
                state.status = StreamStatus::Complete;
                tracing::debug!(rows = delivered, "row stream complete");
            }
        }
        drop(state);
        self.shared.arrived.notify_all();
    }

    /// Signal a terminal stream failure. Rows already pushed stay readable.
    pub fn fail(mut self, message: impl Into<String>) {
        self.settled = true;
        let message = message.into();
        let mut state = self.shared.state.lock();
        tracing::warn!(
            rows = state.rows.len(),
            error = %message,
            "row stream failed"
        );
        state.fail(CursorError::stream_failure(message));
        drop(state);
        self.shared.arrived.notify_all();
    }
}

impl Drop for RowSink {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.shared.state.lock();
        state.fail(CursorError::stream_failure(
            "row stream closed without a completion signal",
        ));
        drop(state);
        self.shared.arrived.notify_all();
    }
}

/// Consumer half, owned by the result set.
///
/// Dropping the receiver detaches the consumer and releases a producer
/// blocked on backpressure.
#[derive(Debug)]
pub struct RowReceiver {
    shared: Arc<Shared>,
}

impl RowReceiver {
    /// Wait for the row at `index` (0-based).
    ///
    /// Raises the demand point to `index + 1` first, which opens the prefetch
    /// window for the producer. Buffered rows are returned even after the
    /// stream failed.
    pub fn wait_for_row(&self, index: usize, timeout: Option<Duration>) -> RowWait {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();

        if index >= state.demand {
            state.demand = index + 1;
            self.shared.drained.notify_all();
        }

        loop {
            if let Some(row) = state.rows.get(index) {
                return RowWait::Ready(Arc::clone(row));
            }
            if let Some(expected) = state.expected
                && index as u64 >= expected
            {
                return RowWait::Exhausted;
            }
            match &state.status {
                StreamStatus::Complete => return RowWait::Exhausted,
                StreamStatus::Failed(err) => return RowWait::Failed(err.clone()),
                StreamStatus::Open => {}
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return RowWait::TimedOut;
                    }
                    self.shared.arrived.wait_until(&mut state, deadline);
                }
                None => self.shared.arrived.wait(&mut state),
            }
        }
    }

    /// Wait until the stream completes or fails.
    ///
    /// Returns the final row count, or `None` if the wait timed out.
    ///
    /// # Errors
    ///
    /// Returns the terminal stream failure.
    pub fn wait_until_settled(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<u64>, CursorError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.shared.state.lock();

        // A drained producer must not stall on the prefetch window.
        state.demand = usize::MAX;
        self.shared.drained.notify_all();

        loop {
            match &state.status {
                StreamStatus::Complete => return Ok(Some(state.rows.len() as u64)),
                StreamStatus::Failed(err) => return Err(err.clone()),
                StreamStatus::Open => {}
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    self.shared.arrived.wait_until(&mut state, deadline);
                }
                None => self.shared.arrived.wait(&mut state),
            }
        }
    }

    /// A read-only view of the stream progress that does not keep the
    /// consumer attached.
    #[must_use]
    pub fn probe(&self) -> StreamProbe {
        StreamProbe {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for RowReceiver {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.consumer_attached = false;
        drop(state);
        self.shared.drained.notify_all();
    }
}

/// Non-blocking view of stream progress.
#[derive(Debug, Clone)]
pub struct StreamProbe {
    shared: Arc<Shared>,
}

impl StreamProbe {
    /// Rows known to exist: the announced total, or the rows buffered so far.
    #[must_use]
    pub fn known_row_count(&self) -> u64 {
        let state = self.shared.state.lock();
        state.expected.unwrap_or(state.rows.len() as u64)
    }

    /// Rows buffered so far.
    #[must_use]
    pub fn buffered_rows(&self) -> usize {
        self.shared.state.lock().rows.len()
    }

    /// The total row count, once announced or once the stream completed.
    #[must_use]
    pub fn final_row_count(&self) -> Option<u64> {
        self.shared.state.lock().expected
    }

    /// True once the stream completed successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.shared.state.lock().status, StreamStatus::Complete)
    }

    /// The terminal failure, if the stream failed.
    #[must_use]
    pub fn failure(&self) -> Option<CursorError> {
        match &self.shared.state.lock().status {
            StreamStatus::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::driver::RawCell;

    fn int_row(v: i64) -> Row {
        Row::new(vec![RawCell::Integer(v)])
    }

    fn value_of(wait: RowWait) -> i64 {
        match wait {
            RowWait::Ready(row) => match row.get(0) {
                Some(RawCell::Integer(v)) => *v,
                other => panic!("unexpected cell {other:?}"),
            },
            other => panic!("row not ready: {other:?}"),
        }
    }

    #[test]
    fn test_rows_arrive_in_order() {
        let (mut sink, rx) = channel(1, None, None);
        for v in 0..3 {
            sink.push(int_row(v)).unwrap();
        }
        sink.complete();

        for v in 0..3 {
            assert_eq!(value_of(rx.wait_for_row(v as usize, None)), v);
        }
        assert!(matches!(rx.wait_for_row(3, None), RowWait::Exhausted));
        assert_eq!(rx.probe().final_row_count(), Some(3));
    }

    #[test]
    fn test_consumer_blocks_until_row_arrives() {
        let (mut sink, rx) = channel(1, None, None);
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            sink.push(int_row(42)).unwrap();
            sink.complete();
        });

        assert_eq!(value_of(rx.wait_for_row(0, None)), 42);
        producer.join().unwrap();
    }

    #[test]
    fn test_failure_keeps_buffered_rows() {
        let (mut sink, rx) = channel(1, Some(5), None);
        sink.push(int_row(1)).unwrap();
        sink.push(int_row(2)).unwrap();
        sink.fail("connection reset by peer");

        assert_eq!(value_of(rx.wait_for_row(1, None)), 2);
        match rx.wait_for_row(2, None) {
            RowWait::Failed(err) => assert!(err.is_stream_failure()),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(rx.probe().failure().is_some());
    }

    #[test]
    fn test_malformed_row_fails_stream() {
        let (mut sink, rx) = channel(2, None, None);
        assert_eq!(sink.push(int_row(1)), Err(SinkClosed));
        drop(sink);

        match rx.wait_for_row(0, None) {
            RowWait::Failed(err) => assert!(err.to_string().contains("expected 2 cells")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_short_stream_against_announced_count_fails() {
        let (mut sink, rx) = channel(1, Some(3), None);
        sink.push(int_row(1)).unwrap();
        sink.complete();
        assert!(rx.wait_until_settled(None).unwrap_err().is_stream_failure());
    }

    #[test]
    fn test_extra_rows_against_announced_count_fail() {
        let (mut sink, rx) = channel(1, Some(1), None);
        sink.push(int_row(1)).unwrap();
        assert_eq!(sink.push(int_row(2)), Err(SinkClosed));
        assert!(rx.probe().failure().is_some());
    }

    #[test]
    fn test_dropped_sink_fails_stream() {
        let (sink, rx) = channel(1, None, None);
        drop(sink);
        assert!(matches!(rx.wait_for_row(0, None), RowWait::Failed(_)));
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let (_sink, rx) = channel(1, None, None);
        let started = Instant::now();
        let wait = rx.wait_for_row(0, Some(Duration::from_millis(20)));
        assert!(matches!(wait, RowWait::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_announced_count_ends_iteration_early() {
        let (mut sink, rx) = channel(1, Some(1), None);
        sink.push(int_row(9)).unwrap();
        // The stream is still open, but index 1 is past the announced total.
        assert!(matches!(rx.wait_for_row(1, None), RowWait::Exhausted));
        assert_eq!(rx.probe().known_row_count(), 1);
    }

    #[test]
    fn test_prefetch_window_applies_backpressure() {
        let window = NonZeroUsize::new(2).unwrap();
        let (mut sink, rx) = channel(1, None, Some(window));
        let probe = rx.probe();

        let producer = thread::spawn(move || {
            for v in 0..10 {
                if sink.push(int_row(v)).is_err() {
                    return;
                }
            }
            sink.complete();
        });

        // Nothing consumed yet: the producer stops at the window.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(probe.buffered_rows(), 2);

        for v in 0..10 {
            assert_eq!(value_of(rx.wait_for_row(v as usize, None)), v);
        }
        producer.join().unwrap();
        assert!(probe.is_complete());
    }

    #[test]
    fn test_detached_consumer_releases_blocked_producer() {
        let window = NonZeroUsize::new(1).unwrap();
        let (mut sink, rx) = channel(1, None, Some(window));

        let producer = thread::spawn(move || {
            let mut pushed = 0;
            while sink.push(int_row(pushed)).is_ok() {
                pushed += 1;
            }
            pushed
        });

        thread::sleep(Duration::from_millis(30));
        drop(rx);
        assert_eq!(producer.join().unwrap(), 1);
    }

    #[test]
    fn test_wait_until_settled_lifts_window() {
        let window = NonZeroUsize::new(1).unwrap();
        let (mut sink, rx) = channel(1, None, Some(window));
        let producer = thread::spawn(move || {
            for v in 0..5 {
                sink.push(int_row(v)).unwrap();
            }
            sink.complete();
        });

        assert_eq!(rx.wait_until_settled(None).unwrap(), Some(5));
        producer.join().unwrap();
    }
}
