//! Errors produced while decoding and delivering event batches.

use thiserror::Error;

use crate::handler::BoxError;

/// Failure of a dispatched invocation.
///
/// The display strings are what the invoking runtime ultimately sees, so the
/// handler's own message is kept verbatim inside the parentheses.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload did not match the source's wire shape.
    #[error("failed to unmarshal event ({0})")]
    Decode(#[source] serde_json::Error),

    /// The whole-batch handler failed.
    #[error("failed to process {event} event ({cause})")]
    Event {
        /// Source name, e.g. `change-stream`.
        event: &'static str,
        /// Handler error.
        #[source]
        cause: BoxError,
    },

    /// A per-record handler failed; later records were not attempted.
    #[error("failed to process {record} {id} ({cause})")]
    Record {
        /// Record noun, e.g. `queue message`.
        record: &'static str,
        /// Identifier of the failing record.
        id: String,
        /// Handler error.
        #[source]
        cause: BoxError,
    },
}

impl DispatchError {
    /// Category reported as the error type of an invocation response.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DecodeError",
            Self::Event { .. } => "EventError",
            Self::Record { .. } => "RecordError",
        }
    }

    /// Wraps a whole-batch handler failure. Record failures already name
    /// their record and pass through unchanged.
    pub(crate) fn event(event: &'static str, cause: BoxError) -> Self {
        match cause.downcast::<Self>() {
            Ok(dispatch) if matches!(*dispatch, Self::Record { .. }) => *dispatch,
            Ok(dispatch) => Self::Event {
                event,
                cause: dispatch,
            },
            Err(other) => Self::Event { event, cause: other },
        }
    }

    /// Identifier of the failing record, for record failures.
    #[must_use]
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Record { id, .. } => Some(id),
            Self::Decode(_) | Self::Event { .. } => None,
        }
    }
}
