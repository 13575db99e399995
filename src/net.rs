use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;

use crate::consts::{DEFAULT_BIND_PORT, DEFAULT_STUN_PORT, RECV_BUF_BYTES, STUN_SERVERS};
use crate::msg::MappedAddress;
use crate::transaction::{ProtocolError, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StunServer {
    pub host: String,
    pub port: u16,
}

impl StunServer {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        StunServer {
            host: host.into(),
            port,
        }
    }

    /// The built-in public servers, in the order they are tried.
    pub fn builtin() -> Vec<StunServer> {
        STUN_SERVERS
            .iter()
            .map(|&(host, port)| StunServer::new(host, port))
            .collect()
    }
}

impl fmt::Display for StunServer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Accepts `host` or `host:port`; the port defaults to 3478.
impl FromStr for StunServer {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|e| {
                    TransportError::InvalidConfig(format!("bad port in '{}': {}", s, e))
                })?;
                (host, port)
            }
            None => (s, DEFAULT_STUN_PORT),
        };
        if host.is_empty() {
            return Err(TransportError::InvalidConfig(format!(
                "missing host in '{}'",
                s
            )));
        }
        Ok(StunServer::new(host, port))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl From<MappedAddress> for DiscoveryResult {
    fn from(mapped: MappedAddress) -> Self {
        DiscoveryResult {
            ip: mapped.ip,
            port: mapped.port,
        }
    }
}

impl fmt::Display for DiscoveryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Why a single server could not give us an address. Only ever logged.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("could not resolve to an IPv4 address: {0}")]
    Resolve(String),
    #[error("could not open socket: {0}")]
    Socket(#[source] io::Error),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    #[error("no response within the timeout")]
    Timeout,
    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("couldn't get external address from any STUN server ({attempts} tried)")]
    AllServersFailed { attempts: u32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// An explicit server replaces the built-in list and gets exactly one attempt.
pub fn select_candidates(server: Option<StunServer>, max_attempts: u32) -> Vec<StunServer> {
    match server {
        Some(server) => vec![server],
        None => StunServer::builtin()
            .into_iter()
            .take(max_attempts as usize)
            .collect(),
    }
}

/// Ask each candidate in turn for our mapped address; the first answer wins.
///
/// Every attempt gets its own socket and transaction, and the socket is closed
/// before the next candidate is tried. Worst case this blocks for
/// `max_attempts * per_attempt_timeout`.
pub fn discover(
    candidates: &[StunServer],
    per_attempt_timeout: Duration,
    max_attempts: u32,
    bind_address: Option<Ipv4Addr>,
    bind_port: Option<u16>,
) -> Result<DiscoveryResult, TransportError> {
    if per_attempt_timeout == Duration::from_secs(0) {
        return Err(TransportError::InvalidConfig(
            "timeout must be positive".to_owned(),
        ));
    }
    if max_attempts == 0 {
        return Err(TransportError::InvalidConfig(
            "at least one attempt is required".to_owned(),
        ));
    }
    let local = SocketAddrV4::new(
        bind_address.unwrap_or(Ipv4Addr::UNSPECIFIED),
        bind_port.unwrap_or(DEFAULT_BIND_PORT),
    );

    let mut attempts = 0;
    for server in candidates.iter().take(max_attempts as usize) {
        attempts += 1;
        info!("Querying STUN server {} (attempt {})", server, attempts);
        match attempt(server, local, per_attempt_timeout) {
            Ok(mapped) => {
                let result = DiscoveryResult::from(mapped);
                info!("{} reports external address {}", server, result);
                return Ok(result);
            }
            Err(e) => warn!("STUN server {} failed: {}", server, e),
        }
    }
    Err(TransportError::AllServersFailed { attempts })
}

fn attempt(
    server: &StunServer,
    local: SocketAddrV4,
    timeout: Duration,
) -> Result<MappedAddress, AttemptError> {
    let remote = resolve(server)?;
    let socket = open_udp(local, timeout).map_err(AttemptError::Socket)?;
    let txn = Transaction::new();
    socket
        .send_to(&txn.request(), remote)
        .map_err(AttemptError::Send)?;

    let mut buf = [0; RECV_BUF_BYTES];
    let (bytes, from) = socket.recv_from(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => AttemptError::Timeout,
        _ => AttemptError::Receive(e),
    })?;
    debug!("{} bytes from {} for {}", bytes, from, server);
    Ok(txn.complete(&buf[..bytes])?)
}

fn resolve(server: &StunServer) -> Result<SocketAddr, AttemptError> {
    let mut addrs = (server.host.as_str(), server.port)
        .to_socket_addrs()
        .map_err(|e| AttemptError::Resolve(e.to_string()))?;
    addrs
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| AttemptError::Resolve(format!("{} has no IPv4 address", server.host)))
}

/// Bind a UDP socket with `SO_REUSEADDR`, so back to back attempts can share
/// the same local port.
///
/// `SO_RCVTIMEO` has microsecond resolution and treats zero as "wait forever",
/// so the timeout is never allowed below one microsecond.
pub fn open_udp(local: SocketAddrV4, read_timeout: Duration) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::V4(local).into())?;
    socket.set_read_timeout(Some(std::cmp::max(read_timeout, MIN_READ_TIMEOUT)))?;
    Ok(socket.into())
}

const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);
