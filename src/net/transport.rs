//! Transport kinds and endpoint resolution.
//!
//! # Responsibilities
//! - Parse the network name (`tcp`, `tcp4`, `tcp6`, `unix`)
//! - Turn an endpoint string into something bindable
//!
//! # Design Decisions
//! - Unknown network names are rejected before anything is bound
//! - `:port` means every interface of the requested family
//! - `tcp4`/`tcp6` only accept addresses of their own family

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Network names accepted on the command line and in config files.
pub const SUPPORTED_NETWORKS: &[&str] = &["tcp", "tcp4", "tcp6", "unix"];

/// The network name is not one of [`SUPPORTED_NETWORKS`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported network protocol: {0}")]
pub struct UnsupportedTransport(pub String);

/// Stream-oriented transport to listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// TCP over whichever family the address resolves to.
    Tcp,
    /// TCP over IPv4 only.
    Tcp4,
    /// TCP over IPv6 only.
    Tcp6,
    /// Unix-domain stream socket.
    Unix,
}

impl Transport {
    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Tcp4 => "tcp4",
            Transport::Tcp6 => "tcp6",
            Transport::Unix => "unix",
        }
    }

    /// Whether `addr` belongs to the family this transport allows.
    pub fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Transport::Tcp => true,
            Transport::Tcp4 => addr.is_ipv4(),
            Transport::Tcp6 => addr.is_ipv6(),
            Transport::Unix => false,
        }
    }

    fn wildcard_host(self) -> &'static str {
        match self {
            Transport::Tcp | Transport::Tcp6 => "[::]",
            _ => "0.0.0.0",
        }
    }
}

impl FromStr for Transport {
    type Err = UnsupportedTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Transport::Tcp),
            "tcp4" => Ok(Transport::Tcp4),
            "tcp6" => Ok(Transport::Tcp6),
            "unix" => Ok(Transport::Unix),
            other => Err(UnsupportedTransport(other.to_string())),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transport paired with the endpoint it should listen on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Host and port, still to be resolved.
    Tcp { transport: Transport, address: String },
    /// Filesystem path of a Unix socket.
    Unix(PathBuf),
}

impl Endpoint {
    /// Build an endpoint from a network name and address string.
    pub fn new(network: &str, address: &str) -> Result<Self, UnsupportedTransport> {
        let transport: Transport = network.parse()?;
        Ok(match transport {
            Transport::Unix => Endpoint::Unix(PathBuf::from(address)),
            transport => Endpoint::Tcp {
                transport,
                address: normalize_host(transport, address),
            },
        })
    }

    pub fn transport(&self) -> Transport {
        match self {
            Endpoint::Tcp { transport, .. } => *transport,
            Endpoint::Unix(_) => Transport::Unix,
        }
    }

    /// Resolve a TCP endpoint to the first address of the allowed family.
    pub async fn resolve_tcp(transport: Transport, address: &str) -> io::Result<SocketAddr> {
        let mut candidates = tokio::net::lookup_host(address).await?;
        candidates.find(|addr| transport.accepts(addr)).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no {} address for {}", transport, address),
            )
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { transport, address } => write!(f, "({}) {}", transport, address),
            Endpoint::Unix(path) => write!(f, "(unix) {}", path.display()),
        }
    }
}

fn normalize_host(transport: Transport, address: &str) -> String {
    if address.starts_with(':') {
        format!("{}{}", transport.wildcard_host(), address)
    } else {
        address.to_string()
    }
}
