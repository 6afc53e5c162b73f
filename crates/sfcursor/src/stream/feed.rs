//! Async row feeder.
//!
//! Drivers built on an async client expose rows as a `futures::Stream`. The
//! feeder pulls that stream on a blocking tokio task and pushes into a
//! [`RowSink`], so a full prefetch window parks a blocking-pool thread
//! instead of a runtime worker.

use std::fmt;

use futures::{Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::RowSink;
use crate::driver::Row;

/// Feed `stream` into `sink` until it ends, fails, or the consumer detaches.
///
/// An `Err` item fails the sink with its display text; the end of the stream
/// completes it.
pub fn spawn_feeder<S, E>(runtime: &Handle, stream: S, sink: RowSink) -> JoinHandle<()>
where
    S: Stream<Item = Result<Row, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let handle = runtime.clone();
    runtime.spawn_blocking(move || {
        let mut stream = Box::pin(stream);
        let mut sink = sink;
        loop {
            match handle.block_on(stream.next()) {
                Some(Ok(row)) => {
                    if sink.push(row).is_err() {
                        tracing::debug!("row consumer detached, stopping feeder");
                        return;
                    }
                }
                Some(Err(err)) => {
                    sink.fail(err.to_string());
                    return;
                }
                None => {
                    sink.complete();
                    return;
                }
            }
        }
    })
}
