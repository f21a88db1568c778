//! TCP transport for invocation connections.
//!
//! The transport binds the listener, runs the single-threaded accept loop,
//! and hands every accepted connection to its own thread. Connection threads
//! are counted so shutdown can wait for them to drain.

mod connection;
mod errors;
mod listener;
#[cfg(test)]
mod listener_tests;
#[cfg(test)]
mod test_utils;
mod tracker;

pub(crate) use self::connection::{ConnectionHandler, LineReader, write_line};
pub use self::errors::ListenerError;
pub(crate) use self::listener::{InvocationListener, run_accept_loop};
pub(crate) use self::tracker::ConnectionTracker;
#[cfg(test)]
pub(crate) use self::test_utils::{BlockingHandler, CountingHandler};

pub(crate) const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
