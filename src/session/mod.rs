//! Per-connection protocol loop.
//!
//! # Data Flow
//! ```text
//! accepted stream
//!     → Greeting (banner written once; failure is logged, not fatal)
//!     → AwaitingRequest
//!         read bytes → framing.rs (line reassembly, size ceiling)
//!         → query::Query::parse → query::find → response.rs
//!         → write reply → AwaitingRequest
//!     → Closed (peer EOF, read error, write error, idle timeout)
//! ```
//!
//! # Design Decisions
//! - Requests on one connection are handled strictly in order
//! - Every reply write failure ends the session, whatever the reply was
//! - The session owns its stream; it is shut down and dropped on every exit

pub mod framing;
pub mod response;

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::net::connection::ConnectionId;
use crate::observability::metrics;
use crate::query::{find, Query};
use crate::store::RecordStore;

pub use framing::{Frame, LineFramer};
pub use response::{Response, GREETING, INVALID_INPUT, NOTHING_FOUND};

/// Bytes reserved in the read buffer before each read.
const READ_CHUNK: usize = 4096;

/// Default ceiling for a single request line.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 4096;

/// Tunables applied to every session.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Longest accepted request line, terminator excluded.
    pub max_request_bytes: usize,
    /// Close the connection after this long without client data.
    pub idle_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            idle_timeout: None,
        }
    }
}

/// Protocol state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Greeting,
    AwaitingRequest,
    Closed,
}

/// Why a session ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The peer closed its side of the connection.
    PeerClosed,
    /// Reading from the connection failed.
    ReadFailed(io::Error),
    /// Writing a reply failed.
    WriteFailed(io::Error),
    /// No data arrived within the idle timeout.
    IdleTimeout,
}

impl CloseReason {
    pub fn is_error(&self) -> bool {
        matches!(self, CloseReason::ReadFailed(_) | CloseReason::WriteFailed(_))
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::ReadFailed(e) => write!(f, "read failed: {}", e),
            CloseReason::WriteFailed(e) => write!(f, "write failed: {}", e),
            CloseReason::IdleTimeout => write!(f, "idle timeout"),
        }
    }
}

/// What a finished session reports back to its spawner.
#[derive(Debug)]
pub struct SessionSummary {
    pub id: ConnectionId,
    pub requests: u64,
    pub reason: CloseReason,
}

enum ReadOutcome {
    Data,
    Eof,
    Failed(io::Error),
    TimedOut,
}

/// One client connection and its protocol state.
pub struct Session<S> {
    id: ConnectionId,
    stream: S,
    store: RecordStore,
    framer: LineFramer,
    buf: BytesMut,
    state: SessionState,
    idle_timeout: Option<Duration>,
    requests: u64,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: ConnectionId, stream: S, store: RecordStore, settings: SessionSettings) -> Self {
        Self {
            id,
            stream,
            store,
            framer: LineFramer::new(settings.max_request_bytes),
            buf: BytesMut::with_capacity(READ_CHUNK),
            state: SessionState::Greeting,
            idle_timeout: settings.idle_timeout,
            requests: 0,
        }
    }

    /// Drive the session until the connection ends.
    pub async fn run(mut self) -> SessionSummary {
        self.greet().await;
        let reason = self.serve().await;

        self.transition(SessionState::Closed);
        if let Err(err) = self.stream.shutdown().await {
            tracing::debug!(connection_id = %self.id, error = %err, "Shutdown after close failed");
        }

        SessionSummary {
            id: self.id,
            requests: self.requests,
            reason,
        }
    }

    async fn greet(&mut self) {
        if let Err(err) = self.write(GREETING).await {
            tracing::warn!(connection_id = %self.id, error = %err, "Failed to write greeting");
        }
        self.transition(SessionState::AwaitingRequest);
    }

    async fn serve(&mut self) -> CloseReason {
        loop {
            while let Some(frame) = self.framer.next_frame(&mut self.buf) {
                if let Err(err) = self.respond(frame).await {
                    return CloseReason::WriteFailed(err);
                }
            }

            match self.read_more().await {
                ReadOutcome::Data => {}
                ReadOutcome::Eof => {
                    while let Some(frame) = self.framer.finish(&mut self.buf) {
                        if let Err(err) = self.respond(frame).await {
                            return CloseReason::WriteFailed(err);
                        }
                    }
                    return CloseReason::PeerClosed;
                }
                ReadOutcome::Failed(err) => return CloseReason::ReadFailed(err),
                ReadOutcome::TimedOut => return CloseReason::IdleTimeout,
            }
        }
    }

    async fn read_more(&mut self) -> ReadOutcome {
        self.buf.reserve(READ_CHUNK);
        let read = self.stream.read_buf(&mut self.buf);

        let result = match self.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => return ReadOutcome::TimedOut,
            },
            None => read.await,
        };

        match result {
            Ok(0) => ReadOutcome::Eof,
            Ok(_) => ReadOutcome::Data,
            Err(err) => ReadOutcome::Failed(err),
        }
    }

    async fn respond(&mut self, frame: Frame) -> io::Result<()> {
        let started = Instant::now();
        self.requests += 1;

        let (outcome, encoded) = {
            let response = answer(&self.store, &frame);
            let matches = match &response {
                Response::Records(records) => records.len(),
                _ => 0,
            };
            tracing::debug!(connection_id = %self.id, outcome = response.outcome(), matches, "Request handled");
            (response.outcome(), response.encode())
        };
        let bytes = encoded.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let written = self.write(&bytes).await;
        metrics::record_request(outcome, started);
        written
    }

    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(connection_id = %self.id, from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }
}

/// Decide the reply for one frame.
fn answer<'s>(store: &'s RecordStore, frame: &Frame) -> Response<'s> {
    let Frame::Request(bytes) = frame else {
        return Response::InvalidInput;
    };

    match Query::parse(bytes) {
        Ok(query) => {
            tracing::debug!(filter = %query.filter, source = query.source.as_str(), "Query parsed");
            let records = find(store, &query.filter);
            if records.is_empty() {
                Response::NothingFound
            } else {
                Response::Records(records)
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected request");
            Response::InvalidInput
        }
    }
}
