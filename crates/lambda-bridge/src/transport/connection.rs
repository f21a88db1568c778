//! Connection handling abstractions and newline framing.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;

use crate::protocol::ProtocolError;

/// Serves one accepted connection until the peer hangs up.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}

/// Reads bounded, newline-terminated lines from a stream.
///
/// Unlike a bare `BufRead::read_line`, the buffer never grows past the limit,
/// so a peer cannot exhaust memory with an unterminated line.
#[derive(Debug)]
pub(crate) struct LineReader<R> {
    inner: BufReader<R>,
    max_bytes: usize,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(inner: R, max_bytes: usize) -> Self {
        Self {
            inner: BufReader::new(inner),
            max_bytes,
        }
    }

    /// Returns the next line without its terminator, or `None` once the peer
    /// has closed the stream cleanly between lines.
    pub(crate) fn read_line(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let mut line = Vec::new();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(ProtocolError::Io(error)),
            };

            if available.is_empty() {
                return if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line))
                };
            }

            let (consumed, complete) = match available.iter().position(|byte| *byte == b'\n') {
                Some(newline) => {
                    line.extend(available.iter().take(newline));
                    (newline + 1, true)
                }
                None => {
                    line.extend_from_slice(available);
                    (available.len(), false)
                }
            };
            self.inner.consume(consumed);

            if line.len() > self.max_bytes {
                return Err(ProtocolError::TooLarge {
                    size: line.len(),
                    max: self.max_bytes,
                });
            }
            if complete {
                return Ok(Some(line));
            }
        }
    }

    pub(crate) fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }
}

/// Writes `bytes` followed by a newline and flushes.
pub(crate) fn write_line<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
