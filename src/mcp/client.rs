/// MCP client side of the exchange
///
/// This module implements the driver that:
/// 1. Writes one JSON-RPC line per request to the server's input
/// 2. Reads the server's output on a dedicated task
/// 3. Waits, with a deadline, for the response whose id matches the request

use std::collections::BTreeSet;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::mcp::framing::{self, Inbound};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::report::Reporter;

/// Outcome of a single send-and-observe step
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The server answered this request
    Response(JsonRpcResponse),
    /// The message was a notification; nothing to wait for
    NotExpected,
    /// The server printed something that isn't JSON-RPC
    Malformed(String),
    /// The deadline passed first
    TimedOut,
    /// The server's output ended
    Closed,
    /// The request could not be written
    WriteFailed,
}

impl Observation {
    pub fn response(&self) -> Option<&JsonRpcResponse> {
        match self {
            Observation::Response(response) => Some(response),
            _ => None,
        }
    }
}

/// Read the server's output line by line and forward each message
///
/// The task ends at end of stream, on a read error, or once the receiver is
/// dropped. Bytes that are not UTF-8 are replaced so they surface as a
/// malformed line instead of stopping the reader.
pub fn spawn_reader<R>(reader: R) -> mpsc::UnboundedReceiver<Inbound>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    debug!("Server output closed");
                    break;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    debug!("Read line: {}", line.trim_end());
                    if let Some(inbound) = framing::parse_line(&line) {
                        if tx.send(inbound).is_err() {
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to read server output: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// JSON-RPC client over a line-delimited byte stream
pub struct McpClient<W> {
    /// Server input; `None` once closed
    writer: Option<W>,
    /// Messages forwarded by the reader task
    inbound: mpsc::UnboundedReceiver<Inbound>,
    /// Ids sent but not yet answered
    pending: BTreeSet<u64>,
    response_timeout: Duration,
}

impl<W: AsyncWrite + Unpin> McpClient<W> {
    /// Create a client from a writer and an already running inbound channel
    pub fn new(writer: W, inbound: mpsc::UnboundedReceiver<Inbound>, response_timeout: Duration) -> Self {
        Self {
            writer: Some(writer),
            inbound,
            pending: BTreeSet::new(),
            response_timeout,
        }
    }

    /// Create a client and start reading `reader` on a background task
    pub fn connect<R>(writer: W, reader: R, response_timeout: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::new(writer, spawn_reader(reader), response_timeout)
    }

    /// Send one request and observe the server's answer
    ///
    /// Never fails: every problem is reported and returned as an
    /// `Observation` so the caller can move on to its next step.
    pub async fn send_and_observe(&mut self, request: &JsonRpcRequest, reporter: &mut dyn Reporter) -> Observation {
        let line = match framing::frame_request(request) {
            Ok(line) => line,
            Err(e) => {
                reporter.write_failed(&io::Error::new(io::ErrorKind::InvalidData, e));
                return Observation::WriteFailed;
            }
        };

        reporter.sending(&line);

        if let Err(e) = self.write_line(&line).await {
            warn!("Failed to write {} request: {}", request.method, e);
            reporter.write_failed(&e);
            return Observation::WriteFailed;
        }

        let Some(id) = request.id else {
            return Observation::NotExpected;
        };

        self.pending.insert(id);
        self.await_response(id, reporter).await
    }

    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "server input already closed"))?;

        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }

    /// Wait for the response to `id`, reporting anything else that shows up
    async fn await_response(&mut self, id: u64, reporter: &mut dyn Reporter) -> Observation {
        let deadline = Instant::now() + self.response_timeout;

        loop {
            let inbound = match tokio::time::timeout_at(deadline, self.inbound.recv()).await {
                Err(_) => {
                    // Stays pending so a late answer is recognised
                    debug!("Request {} timed out", id);
                    reporter.timed_out(id, self.response_timeout);
                    return Observation::TimedOut;
                }
                Ok(None) => {
                    reporter.stream_closed(id);
                    return Observation::Closed;
                }
                Ok(Some(inbound)) => inbound,
            };

            match inbound {
                Inbound::Response(response) if response.sequence_number() == Some(id) => {
                    self.pending.remove(&id);
                    reporter.received(&response);
                    return Observation::Response(response);
                }
                Inbound::Malformed { line, reason } => {
                    reporter.parse_error(&line, &reason);
                    return Observation::Malformed(reason);
                }
                other => self.report_stray(other, reporter),
            }
        }
    }

    /// Report a message that doesn't answer the request being waited on
    fn report_stray(&mut self, inbound: Inbound, reporter: &mut dyn Reporter) {
        match inbound {
            Inbound::Response(response) => match response.sequence_number() {
                Some(id) if self.pending.remove(&id) => reporter.late_response(&response),
                _ => reporter.unsolicited_response(&response),
            },
            Inbound::ServerMessage { method, params, .. } => reporter.server_message(&method, params.as_ref()),
            Inbound::Malformed { line, reason } => reporter.parse_error(&line, &reason),
        }
    }

    /// Report everything the reader task has queued, without waiting
    ///
    /// Returns the number of messages reported.
    pub fn drain(&mut self, reporter: &mut dyn Reporter) -> usize {
        let mut count = 0;
        while let Ok(inbound) = self.inbound.try_recv() {
            self.report_stray(inbound, reporter);
            count += 1;
        }
        count
    }

    /// Ids that were sent and never answered, in ascending order
    pub fn pending(&self) -> Vec<u64> {
        self.pending.iter().copied().collect()
    }

    /// Close the server's input, signalling end of session
    pub async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Error closing server input: {}", e);
            }
        }
    }
}
