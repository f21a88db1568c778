//! Blocking client for the invocation protocol.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::{
    CallEnvelope, INVOKE_METHOD, InvokeRequest, InvokeResponse, MAX_LINE_BYTES, PING_METHOD, Ping,
    ProtocolError, ReplyEnvelope,
};
use crate::transport::{LineReader, write_line};

/// One connection to an [`InvocationServer`](crate::InvocationServer).
///
/// Calls are sequential: each call waits for its reply before returning.
#[derive(Debug)]
pub struct InvocationClient {
    connection: LineReader<TcpStream>,
    next_id: u64,
}

impl InvocationClient {
    /// Connects to `addr`.
    pub fn connect(addr: SocketAddr) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        Ok(Self {
            connection: LineReader::new(stream, MAX_LINE_BYTES),
            next_id: 1,
        })
    }

    /// Bounds how long a call waits for its reply.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<(), ProtocolError> {
        self.connection.get_mut().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Runs the handler once.
    pub fn invoke(&mut self, request: &InvokeRequest) -> Result<InvokeResponse, ProtocolError> {
        self.call(INVOKE_METHOD, request)
    }

    /// Checks the server is answering.
    pub fn ping(&mut self) -> Result<(), ProtocolError> {
        let Ping {} = self.call(PING_METHOD, &Ping {})?;
        Ok(())
    }

    /// Sends a raw call and decodes its result.
    pub fn call<P, R>(&mut self, method: &str, params: &P) -> Result<R, ProtocolError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let call = CallEnvelope {
            id,
            method: method.to_owned(),
            params: serde_json::to_value(params)?,
        };
        write_line(self.connection.get_mut(), &serde_json::to_vec(&call)?)?;

        let line = self.connection.read_line()?.ok_or(ProtocolError::Closed)?;
        let reply: ReplyEnvelope = serde_json::from_slice(&line)?;
        if reply.id != id {
            return Err(ProtocolError::UnexpectedReply {
                expected: id,
                actual: reply.id,
            });
        }
        if let Some(error) = reply.error {
            return Err(ProtocolError::Remote(error));
        }
        Ok(serde_json::from_value(reply.result.unwrap_or(Value::Null))?)
    }
}
