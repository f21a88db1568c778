//! Queue messages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EventSource, Identify, decode_records};

/// Queue event source; each record is one delivered message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Queue;

impl EventSource for Queue {
    type Record = QueueMessage;

    const EVENT: &'static str = "queue";
    const RECORD: &'static str = "queue message";

    fn decode(payload: &[u8]) -> Result<Vec<QueueMessage>, serde_json::Error> {
        decode_records(payload)
    }
}

/// One message delivered from a queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueMessage {
    /// Queue-assigned message identifier.
    pub message_id: String,
    /// Handle used to acknowledge or delete the message.
    pub receipt_handle: String,
    /// Message body as sent.
    pub body: String,
    /// MD5 digest of `body`.
    #[serde(rename = "md5OfBody")]
    pub md5_of_body: String,
    /// MD5 digest of the message attributes.
    #[serde(rename = "md5OfMessageAttributes")]
    pub md5_of_message_attributes: String,
    /// System attributes such as `ApproximateReceiveCount`.
    pub attributes: HashMap<String, String>,
    /// Sender-defined attributes in their typed wire form.
    pub message_attributes: Map<String, Value>,
    /// Name of the delivering service.
    pub event_source: String,
    /// Identifier of the source queue.
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
    /// Region the queue lives in.
    pub aws_region: String,
}

impl Identify for QueueMessage {
    fn id(&self) -> &str {
        &self.message_id
    }
}
