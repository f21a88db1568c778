//! Wire format spoken between the invoking runtime and the server.
//!
//! Each direction carries newline-delimited JSON. A call names a method and
//! carries its parameters; the reply echoes the call id and carries either a
//! result or an envelope-level error. Handler failures are not envelope
//! errors: they travel inside a successful [`InvokeResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::context::InvocationContext;

/// Method that runs the registered handler.
pub const INVOKE_METHOD: &str = "Function.Invoke";

/// Liveness probe method.
pub const PING_METHOD: &str = "Function.Ping";

/// Largest accepted line, in bytes, in either direction.
pub const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// One method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Caller-chosen id echoed in the reply.
    pub id: u64,
    /// Method name, e.g. [`INVOKE_METHOD`].
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// Reply to a [`CallEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// Id of the call being answered; zero when the call was unreadable.
    pub id: u64,
    /// Method result on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Envelope-level failure (unknown method, malformed call).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyEnvelope {
    /// Successful reply.
    #[must_use]
    pub const fn result(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Envelope-level failure.
    #[must_use]
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Parameters of [`INVOKE_METHOD`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Opaque event payload.
    #[serde(default, with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// Correlation id supplied by the runtime.
    #[serde(default)]
    pub request_id: String,
    /// Deadline in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<i64>,
    /// ARN the runtime invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoked_function_arn: Option<String>,
    /// Upstream trace header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl InvokeRequest {
    /// Request carrying `payload` and a correlation id.
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>, request_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Builds the handler-facing context for this request.
    #[must_use]
    pub fn context(&self) -> InvocationContext {
        InvocationContext::with_request_id(self.request_id.clone())
            .deadline_ms(self.deadline_ms)
            .invoked_function_arn(self.invoked_function_arn.clone())
            .trace_id(self.trace_id.clone())
    }
}

/// Result of [`INVOKE_METHOD`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeResponse {
    /// Handler output; empty on error.
    #[serde(default, with = "base64_bytes")]
    pub payload: Vec<u8>,
    /// Handler failure, if any.
    #[serde(default)]
    pub error: Option<InvokeError>,
}

impl InvokeResponse {
    /// Successful response.
    #[must_use]
    pub const fn success(payload: Vec<u8>) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    /// Failed response.
    #[must_use]
    pub const fn failure(error: InvokeError) -> Self {
        Self {
            payload: Vec::new(),
            error: Some(error),
        }
    }
}

/// Handler failure reported back to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeError {
    /// Error category, e.g. `RecordError` or `Panic`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message, passed through verbatim.
    pub message: String,
}

/// Parameters and result of [`PING_METHOD`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {}

/// Errors raised while speaking the wire protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Reading or writing the connection failed.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    /// A line was not valid JSON for the expected shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    /// A line exceeded [`MAX_LINE_BYTES`].
    #[error("message of {size} bytes exceeds the {max} byte limit")]
    TooLarge {
        /// Bytes read before giving up.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// The peer closed the connection before replying.
    #[error("connection closed by peer")]
    Closed,
    /// The peer answered with an envelope-level error.
    #[error("remote error: {0}")]
    Remote(String),
    /// The reply did not answer the outstanding call.
    #[error("reply id {actual} does not match call id {expected}")]
    UnexpectedReply {
        /// Id of the outstanding call.
        expected: u64,
        /// Id carried by the reply.
        actual: u64,
    },
}

/// `serde` adapter encoding byte buffers as standard base64 strings.
pub(crate) mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(crate) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}
