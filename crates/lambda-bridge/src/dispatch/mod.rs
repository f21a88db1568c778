//! Generic decode-then-deliver engine shared by every event source.
//!
//! [`BatchDispatcher`] is the [`Handler`](crate::Handler) the server
//! registers. It decodes the payload through an
//! [`EventSource`](crate::events::EventSource) and hands the batch to a
//! [`BatchHandler`]. [`PerRecord`] adapts a [`RecordHandler`] so that records
//! are delivered one at a time with fail-fast error handling.

mod batch;
mod errors;
mod record;

pub use self::batch::{BatchDispatcher, BatchHandler};
pub use self::errors::DispatchError;
pub use self::record::{PerRecord, RecordHandler};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
