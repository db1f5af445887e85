//! Client for the COVID-19 data lookup service.
//!
//! Replies on the wire are not uniformly terminated (`Invalid Input` carries
//! no newline), so the client recognises each reply by its shape rather than
//! by reading lines.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use tokio::net::UnixStream;

pub const GREETING: &[u8] = b"Connected...\nUsage: JSON format input only\n";
pub const INVALID_INPUT: &[u8] = b"Invalid Input";
pub const NOTHING_FOUND: &[u8] = b"Nothing found\n";

/// One dataset row as served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub cumulative_test_positive: String,
    pub cumulative_test_performed: String,
    pub date: String,
    pub discharged: String,
    pub expired: String,
    pub region: String,
    pub admitted: String,
}

/// A decoded server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Records(Vec<Record>),
    NothingFound,
    InvalidInput,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected greeting: {0:?}")]
    Greeting(String),
    #[error("malformed reply: {0}")]
    Protocol(String),
    #[error("connection closed before a full reply arrived")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// A connection to the lookup service.
pub struct QueryClient<S> {
    stream: S,
    buf: Vec<u8>,
}

impl QueryClient<TcpStream> {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Self::handshake(stream).await
    }
}

#[cfg(unix)]
impl QueryClient<UnixStream> {
    pub async fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        Self::handshake(stream).await
    }
}

impl<S> QueryClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a connected stream and consume the greeting banner.
    pub async fn handshake(stream: S) -> Result<Self> {
        let mut client = Self {
            stream,
            buf: Vec::new(),
        };
        while client.buf.len() < GREETING.len() {
            if !GREETING.starts_with(&client.buf) {
                break;
            }
            if !client.fill().await? {
                return Err(ClientError::Closed);
            }
        }
        if !client.buf.starts_with(GREETING) {
            return Err(ClientError::Greeting(
                String::from_utf8_lossy(&client.buf).into_owned(),
            ));
        }
        client.buf.drain(..GREETING.len());
        Ok(client)
    }

    pub async fn query_region(&mut self, region: &str) -> Result<Reply> {
        self.send(json!({ "query": { "region": region } }).to_string().as_bytes())
            .await
    }

    pub async fn query_date(&mut self, date: &str) -> Result<Reply> {
        self.send(json!({ "query": { "date": date } }).to_string().as_bytes())
            .await
    }

    /// Send one request line and wait for its reply.
    pub async fn send(&mut self, line: &[u8]) -> Result<Reply> {
        self.write_raw(line).await?;
        self.write_raw(b"\n").await?;
        self.read_reply().await
    }

    /// Write bytes as-is, without a terminator.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Close the write half; the server still answers what it has buffered.
    pub async fn close_write(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    pub async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if let Some(reply) = self.decode()? {
                return Ok(reply);
            }
            if !self.fill().await? {
                return Err(ClientError::Closed);
            }
        }
    }

    /// True once the server has closed the connection and nothing is pending.
    pub async fn is_closed(&mut self) -> Result<bool> {
        self.skip_newlines();
        Ok(self.buf.is_empty() && !self.fill().await?)
    }

    async fn fill(&mut self) -> Result<bool> {
        let mut chunk = [0u8; 4096];
        let n = self.stream.read(&mut chunk).await?;
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(n > 0)
    }

    fn skip_newlines(&mut self) {
        let leading = self.buf.iter().take_while(|b| **b == b'\n').count();
        self.buf.drain(..leading);
    }

    fn decode(&mut self) -> Result<Option<Reply>> {
        self.skip_newlines();
        if self.buf.is_empty() {
            return Ok(None);
        }

        for (marker, reply) in [
            (INVALID_INPUT, Reply::InvalidInput),
            (NOTHING_FOUND, Reply::NothingFound),
        ] {
            if self.buf.starts_with(marker) {
                self.buf.drain(..marker.len());
                return Ok(Some(reply));
            }
            if marker.starts_with(&self.buf) {
                return Ok(None);
            }
        }

        if self.buf[0] != b'[' {
            return Err(ClientError::Protocol(
                String::from_utf8_lossy(&self.buf).into_owned(),
            ));
        }

        let mut stream = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Vec<Record>>();
        match stream.next() {
            Some(Ok(records)) => {
                let consumed = stream.byte_offset();
                self.buf.drain(..consumed);
                Ok(Some(Reply::Records(records)))
            }
            Some(Err(err)) if err.is_eof() => Ok(None),
            Some(Err(err)) => Err(ClientError::Protocol(err.to_string())),
            None => Ok(None),
        }
    }
}
