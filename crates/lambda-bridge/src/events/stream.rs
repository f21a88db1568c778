//! Partitioned stream records.

use serde::{Deserialize, Serialize};

use super::{EventSource, Identify, decode_records};
use crate::protocol::base64_bytes;

/// Partitioned stream event source; record data arrives base64-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stream;

impl EventSource for Stream {
    type Record = StreamRecord;

    const EVENT: &'static str = "stream";
    const RECORD: &'static str = "stream record";

    fn decode(payload: &[u8]) -> Result<Vec<StreamRecord>, serde_json::Error> {
        decode_records(payload)
    }
}

/// One record read from a stream shard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamRecord {
    /// Shard and sequence based record identifier.
    #[serde(rename = "eventID")]
    pub event_id: String,
    /// Event name reported by the stream.
    pub event_name: String,
    /// Name of the delivering service.
    pub event_source: String,
    /// Identifier of the source stream.
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
    /// Schema version of the record envelope.
    pub event_version: String,
    /// Role the function was invoked with.
    pub invoke_identity_arn: String,
    /// Region the stream lives in.
    pub aws_region: String,
    /// Shard payload.
    pub kinesis: StreamPayload,
}

/// Shard-level payload of a [`StreamRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamPayload {
    /// Key that selected the shard.
    #[serde(alias = "PartitionKey")]
    pub partition_key: String,
    /// Position of the record within its shard.
    #[serde(alias = "SequenceNumber")]
    pub sequence_number: String,
    /// Decoded record data.
    #[serde(alias = "Data", with = "base64_bytes")]
    pub data: Vec<u8>,
    /// Schema version of the shard payload.
    pub kinesis_schema_version: String,
    /// Arrival time in seconds since the epoch.
    pub approximate_arrival_timestamp: Option<f64>,
    /// Server-side encryption applied to the record, if any.
    pub encryption_type: Option<String>,
}

impl Identify for StreamRecord {
    fn id(&self) -> &str {
        &self.event_id
    }
}
