//! Find this host's external IPv4 address and UDP port with RFC 3489 STUN.
//!
//! ```no_run
//! let (ip, port) = stun_probe::discover_external_address(None, 5.0, 3, "0.0.0.0", 54320)?;
//! println!("External IP: {}", ip);
//! println!("External port: {}", port);
//! # Ok::<(), stun_probe::TransportError>(())
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod consts;
pub mod msg;
pub mod net;
pub mod options;
pub mod server;
pub mod transaction;

pub use config::DiscoveryConfig;
pub use msg::{DecodeError, MappedAddress, TransactionId};
pub use net::{discover, DiscoveryResult, StunServer, TransportError};
pub use transaction::ProtocolError;

/// Ask a STUN server for our external address.
///
/// With `server` unset the built-in public servers are tried, up to
/// `max_attempts` of them; an explicit server gets a single attempt. Each
/// attempt waits at most `timeout_seconds`.
pub fn discover_external_address(
    server: Option<(&str, u16)>,
    timeout_seconds: f64,
    max_attempts: u32,
    bind_address: &str,
    bind_port: u16,
) -> Result<(String, u16), TransportError> {
    let mut config = DiscoveryConfig::default()
        .with_timeout(config::timeout_from_secs(timeout_seconds)?)
        .with_max_attempts(max_attempts)
        .with_bind(config::parse_bind_address(bind_address)?, bind_port);
    if let Some((host, port)) = server {
        config = config.with_server(StunServer::new(host, port));
    }
    let result = config.discover()?;
    Ok((result.ip.to_string(), result.port))
}
