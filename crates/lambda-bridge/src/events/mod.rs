//! Event shapes delivered by the supported upstream sources.
//!
//! Every source delivers a JSON object with a `Records` array. An
//! [`EventSource`] knows how to decode that array into typed records and
//! names the source in diagnostics; [`Identify`] exposes the per-record id
//! carried into logs and error messages.

mod change_stream;
mod queue;
mod stream;

use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use change_stream::{ChangeOperation, ChangeStream, ChangeStreamRecord, StreamChange};
pub use queue::{Queue, QueueMessage};
pub use stream::{Stream, StreamPayload, StreamRecord};

/// Exposes the identifier of a record for diagnostics.
pub trait Identify {
    /// Identifier as it appeared on the wire.
    fn id(&self) -> &str;
}

/// Decode half of an event-source adapter.
pub trait EventSource: 'static {
    /// Record type carried in the batch.
    type Record: Identify + Send + Sync + 'static;

    /// Name used when a whole event fails, e.g. `change-stream`.
    const EVENT: &'static str;

    /// Name used when a single record fails, e.g. `queue message`.
    const RECORD: &'static str;

    /// Decodes a raw payload into records, preserving wire order.
    fn decode(payload: &[u8]) -> Result<Vec<Self::Record>, serde_json::Error>;
}

#[derive(Deserialize)]
struct RecordsEnvelope<R> {
    #[serde(rename = "Records", default = "Vec::new")]
    records: Vec<R>,
}

/// Decodes the `Records` array shared by every supported source.
///
/// A payload without a `Records` field decodes to an empty batch.
pub(crate) fn decode_records<R>(payload: &[u8]) -> Result<Vec<R>, serde_json::Error>
where
    R: DeserializeOwned,
{
    serde_json::from_slice::<RecordsEnvelope<R>>(payload).map(|envelope| envelope.records)
}
