//! Stream listener over TCP or Unix-domain sockets.
//!
//! # Responsibilities
//! - Bind to the configured endpoint
//! - Accept incoming connections as one stream type for the session layer
//! - Optionally cap concurrent connections via semaphore
//!
//! # Design Decisions
//! - Without a cap, accepting never waits on session work
//! - With a cap, a permit is taken before `accept`, so excess clients queue
//!   in the kernel backlog instead of being accepted and starved

use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::net::transport::{Endpoint, Transport};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(io::Error),
    /// Failed to accept connection.
    Accept(io::Error),
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Bind(e) | ListenerError::Accept(e) => Some(e),
        }
    }
}

/// Name of one end of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketName {
    Tcp(SocketAddr),
    /// Unix socket path; unnamed for most client sockets.
    Unix(Option<PathBuf>),
}

impl fmt::Display for SocketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketName::Tcp(addr) => write!(f, "{}", addr),
            SocketName::Unix(Some(path)) => write!(f, "{}", path.display()),
            SocketName::Unix(None) => write!(f, "unix:unnamed"),
        }
    }
}

enum Inner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// A bound listener, optionally limiting concurrent connections.
pub struct Listener {
    inner: Inner,
    connection_limit: Option<Arc<Semaphore>>,
}

/// One accepted connection.
#[derive(Debug)]
pub struct Accepted {
    pub stream: ConnectionStream,
    pub peer: SocketName,
    /// Held for the connection's lifetime when a cap is configured.
    pub permit: Option<ConnectionPermit>,
}

impl Listener {
    /// Bind to `endpoint`. `max_connections == 0` means unlimited.
    pub async fn bind(endpoint: &Endpoint, max_connections: usize) -> Result<Self, ListenerError> {
        let inner = match endpoint {
            Endpoint::Tcp { transport, address } => {
                let addr = Endpoint::resolve_tcp(*transport, address)
                    .await
                    .map_err(ListenerError::Bind)?;
                Inner::Tcp(bind_tcp(*transport, addr).await.map_err(ListenerError::Bind)?)
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => Inner::Unix(UnixListener::bind(path).map_err(ListenerError::Bind)?),
            #[cfg(not(unix))]
            Endpoint::Unix(_) => {
                return Err(ListenerError::Bind(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                )))
            }
        };

        let listener = Self::from_parts(inner, max_connections);
        let local = listener.local_name().map_err(ListenerError::Bind)?;
        tracing::info!(address = %local, max_connections, "Listener bound");
        Ok(listener)
    }

    /// Wrap an already-bound TCP listener.
    pub fn from_tcp(listener: TcpListener, max_connections: usize) -> Self {
        Self::from_parts(Inner::Tcp(listener), max_connections)
    }

    fn from_parts(inner: Inner, max_connections: usize) -> Self {
        let connection_limit = (max_connections > 0).then(|| Arc::new(Semaphore::new(max_connections)));
        Self {
            inner,
            connection_limit,
        }
    }

    /// Accept a new connection, respecting the connection limit.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        let permit = match &self.connection_limit {
            Some(limit) => Some(ConnectionPermit {
                _permit: Arc::clone(limit)
                    .acquire_owned()
                    .await
                    .map_err(|e| ListenerError::Accept(io::Error::other(e)))?,
            }),
            None => None,
        };

        let (stream, peer) = match &self.inner {
            Inner::Tcp(listener) => {
                let (stream, addr) = listener.accept().await.map_err(ListenerError::Accept)?;
                (ConnectionStream::Tcp(stream), SocketName::Tcp(addr))
            }
            #[cfg(unix)]
            Inner::Unix(listener) => {
                let (stream, addr) = listener.accept().await.map_err(ListenerError::Accept)?;
                let path = addr.as_pathname().map(|p| p.to_path_buf());
                (ConnectionStream::Unix(stream), SocketName::Unix(path))
            }
        };

        tracing::debug!(
            peer_addr = %peer,
            available_permits = ?self.available_permits(),
            "Connection accepted"
        );

        Ok(Accepted { stream, peer, permit })
    }

    /// Name this listener is bound to.
    pub fn local_name(&self) -> io::Result<SocketName> {
        match &self.inner {
            Inner::Tcp(listener) => listener.local_addr().map(SocketName::Tcp),
            #[cfg(unix)]
            Inner::Unix(listener) => {
                let addr = listener.local_addr()?;
                Ok(SocketName::Unix(addr.as_pathname().map(|p| p.to_path_buf())))
            }
        }
    }

    /// Current free connection slots, `None` when unlimited.
    pub fn available_permits(&self) -> Option<usize> {
        self.connection_limit.as_ref().map(|limit| limit.available_permits())
    }
}

/// Bind a TCP socket. For plain `tcp` the IPv6 wildcard listens on both
/// families (unless the host forces `IPV6_V6ONLY`); hosts without IPv6 fall
/// back to the IPv4 wildcard.
async fn bind_tcp(transport: Transport, addr: SocketAddr) -> io::Result<TcpListener> {
    match TcpListener::bind(addr).await {
        Err(err) if transport == Transport::Tcp && addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED) => {
            tracing::debug!(error = %err, "IPv6 wildcard unavailable, binding IPv4 only");
            TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port())).await
        }
        result => result,
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

/// An accepted stream of either transport.
#[derive(Debug)]
pub enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl AsyncRead for ConnectionStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(unix)]
            ConnectionStream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ConnectionStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            ConnectionStream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            #[cfg(unix)]
            ConnectionStream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Tcp(s) => Pin::new(s).poll_flush(cx),
            #[cfg(unix)]
            ConnectionStream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            ConnectionStream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(unix)]
            ConnectionStream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}
