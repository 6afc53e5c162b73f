//! Row stream hand-off between the driver and the result set.
//!
//! [`buffer`] holds the synchronous single-producer / single-consumer buffer.
//! With the `async` feature, [`feed`] drives a `futures::Stream` of rows into
//! a [`RowSink`] from a blocking tokio task.

pub mod buffer;
#[cfg(feature = "async")]
pub mod feed;

pub use buffer::{RowReceiver, RowSink, RowWait, SinkClosed, StreamProbe, channel};
#[cfg(feature = "async")]
pub use feed::spawn_feeder;
