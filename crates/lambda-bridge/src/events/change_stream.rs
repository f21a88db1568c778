//! Table change-stream records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EventSource, Identify, decode_records};

/// Table change-stream event source; each record describes one item change.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeStream;

impl EventSource for ChangeStream {
    type Record = ChangeStreamRecord;

    const EVENT: &'static str = "change-stream";
    const RECORD: &'static str = "change-stream record";

    fn decode(payload: &[u8]) -> Result<Vec<ChangeStreamRecord>, serde_json::Error> {
        decode_records(payload)
    }
}

/// One item-level change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeStreamRecord {
    /// Unique identifier of the change.
    #[serde(rename = "eventID")]
    pub event_id: String,
    /// `INSERT`, `MODIFY` or `REMOVE`.
    pub event_name: String,
    /// Schema version of the record envelope.
    pub event_version: String,
    /// Name of the delivering service.
    pub event_source: String,
    /// Identifier of the source table stream.
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
    /// Region the table lives in.
    pub aws_region: String,
    /// Item images and stream metadata.
    pub dynamodb: StreamChange,
    /// Principal behind service-initiated changes such as expiry.
    pub user_identity: Option<Value>,
}

impl ChangeStreamRecord {
    /// Kind of change, when `eventName` is recognised.
    #[must_use]
    pub fn operation(&self) -> Option<ChangeOperation> {
        match self.event_name.as_str() {
            "INSERT" => Some(ChangeOperation::Insert),
            "MODIFY" => Some(ChangeOperation::Modify),
            "REMOVE" => Some(ChangeOperation::Remove),
            _ => None,
        }
    }
}

impl Identify for ChangeStreamRecord {
    fn id(&self) -> &str {
        &self.event_id
    }
}

/// Kinds of item change a change stream reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOperation {
    /// A new item was written.
    Insert,
    /// An existing item was updated.
    Modify,
    /// An item was deleted.
    Remove,
}

/// Item images and stream metadata. Attribute maps keep their typed JSON
/// encoding (`{"S": "..."}`, `{"N": "..."}`) untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StreamChange {
    /// Time the change was recorded, in seconds since the epoch.
    pub approximate_creation_date_time: Option<f64>,
    /// Primary key attributes of the item.
    pub keys: Map<String, Value>,
    /// Item after the change, when the view type includes it.
    pub new_image: Map<String, Value>,
    /// Item before the change, when the view type includes it.
    pub old_image: Map<String, Value>,
    /// Position of the change within its shard.
    pub sequence_number: String,
    /// Size of the change record.
    pub size_bytes: u64,
    /// Which images the stream carries.
    pub stream_view_type: String,
}
