//! Serves the invocation protocol on an accepted connection.

use std::any::Any;
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::request_id;
use crate::dispatch::DispatchError;
use crate::handler::{BoxError, Handler};
use crate::protocol::{
    CallEnvelope, INVOKE_METHOD, InvokeError, InvokeRequest, InvokeResponse, MAX_LINE_BYTES,
    PING_METHOD, Ping, ReplyEnvelope,
};
use crate::transport::{ConnectionHandler, LISTENER_TARGET, LineReader, write_line};

/// Error type reported for handler failures that carry no category.
pub(crate) const HANDLER_ERROR_KIND: &str = "HandlerError";

/// Error type reported when the handler panicked.
pub(crate) const PANIC_KIND: &str = "Panic";

/// Registers one [`Handler`] as the connection's only function.
pub(crate) struct FunctionEndpoint {
    handler: Arc<dyn Handler>,
}

impl FunctionEndpoint {
    pub(crate) const fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// Answers one raw call line.
    pub(crate) fn reply_to(&self, line: &[u8]) -> ReplyEnvelope {
        let call: CallEnvelope = match serde_json::from_slice(line) {
            Ok(call) => call,
            Err(error) => return ReplyEnvelope::error(0, format!("malformed call: {error}")),
        };

        match call.method.as_str() {
            INVOKE_METHOD => self.invoke(call.id, call.params),
            PING_METHOD => encode_result(call.id, &Ping {}),
            other => ReplyEnvelope::error(call.id, format!("unknown method {other}")),
        }
    }

    fn invoke(&self, id: u64, params: Value) -> ReplyEnvelope {
        let request: InvokeRequest = match serde_json::from_value(params) {
            Ok(request) => request,
            Err(error) => {
                return ReplyEnvelope::error(id, format!("malformed invoke request: {error}"));
            }
        };
        let context = request.context();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.invoke(&context, &request.payload)
        }));
        let response = match outcome {
            Ok(Ok(payload)) => InvokeResponse::success(payload),
            Ok(Err(error)) => {
                debug!(
                    target: LISTENER_TARGET,
                    request_id = request_id(&context),
                    error = %error,
                    "handler returned an error"
                );
                InvokeResponse::failure(InvokeError {
                    kind: error_kind(&error).to_owned(),
                    message: error.to_string(),
                })
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(
                    target: LISTENER_TARGET,
                    request_id = request_id(&context),
                    panic = %message,
                    "handler panicked"
                );
                InvokeResponse::failure(InvokeError {
                    kind: PANIC_KIND.to_owned(),
                    message,
                })
            }
        };
        encode_result(id, &response)
    }
}

impl ConnectionHandler for FunctionEndpoint {
    fn handle(&self, stream: TcpStream) {
        let mut reader = LineReader::new(stream, MAX_LINE_BYTES);
        loop {
            let line = match reader.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    warn!(target: LISTENER_TARGET, error = %error, "dropping connection");
                    break;
                }
            };

            let reply = self.reply_to(&line);
            let encoded = match serde_json::to_vec(&reply) {
                Ok(encoded) => encoded,
                Err(error) => {
                    warn!(target: LISTENER_TARGET, error = %error, "failed to encode reply");
                    break;
                }
            };
            if let Err(error) = write_line(reader.get_mut(), &encoded) {
                warn!(target: LISTENER_TARGET, error = %error, "failed to write reply");
                break;
            }
        }
    }
}

fn encode_result<T: serde::Serialize>(id: u64, result: &T) -> ReplyEnvelope {
    match serde_json::to_value(result) {
        Ok(value) => ReplyEnvelope::result(id, value),
        Err(error) => ReplyEnvelope::error(id, format!("failed to encode result: {error}")),
    }
}

/// Category for a handler error: dispatch failures keep their own kind.
pub(crate) fn error_kind(error: &BoxError) -> &'static str {
    error
        .downcast_ref::<DispatchError>()
        .map_or(HANDLER_ERROR_KIND, DispatchError::kind)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_owned())
}
