use std::net::Ipv4Addr;
use std::time::Duration;

use crate::consts::{DEFAULT_BIND_PORT, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
use crate::net::{self, DiscoveryResult, StunServer, TransportError};

/// Everything one call to [`DiscoveryConfig::discover`] needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Overrides the built-in list when set.
    pub server: Option<StunServer>,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub bind_address: Ipv4Addr,
    pub bind_port: u16,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            server: None,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            bind_address: Ipv4Addr::UNSPECIFIED,
            bind_port: DEFAULT_BIND_PORT,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_server(mut self, server: StunServer) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_bind(mut self, address: Ipv4Addr, port: u16) -> Self {
        self.bind_address = address;
        self.bind_port = port;
        self
    }

    pub fn candidates(&self) -> Vec<StunServer> {
        net::select_candidates(self.server.clone(), self.max_attempts)
    }

    pub fn discover(&self) -> Result<DiscoveryResult, TransportError> {
        let candidates = self.candidates();
        // An explicit server is a single attempt, whatever max_attempts says.
        let max_attempts = if self.server.is_some() {
            1
        } else {
            self.max_attempts
        };
        net::discover(
            &candidates,
            self.timeout,
            max_attempts,
            Some(self.bind_address),
            Some(self.bind_port),
        )
    }
}

pub fn timeout_from_secs(secs: f64) -> Result<Duration, TransportError> {
    if !secs.is_finite() || secs <= 0.0 || secs >= std::u64::MAX as f64 {
        return Err(TransportError::InvalidConfig(format!(
            "timeout must be a positive number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

pub fn parse_bind_address(address: &str) -> Result<Ipv4Addr, TransportError> {
    address.parse().map_err(|_| {
        TransportError::InvalidConfig(format!("'{}' is not an IPv4 address", address))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.bind_address, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.bind_port, 54320);
        assert_eq!(config.candidates().len(), 3);
    }

    #[test]
    fn explicit_server_overrides_list() {
        let config = DiscoveryConfig::default()
            .with_max_attempts(6)
            .with_server(StunServer::new("stun.example.org", 3478));
        assert_eq!(
            config.candidates(),
            vec![StunServer::new("stun.example.org", 3478)]
        );
    }

    #[test]
    fn timeouts() {
        assert_eq!(timeout_from_secs(0.25).unwrap(), Duration::from_millis(250));
        assert!(timeout_from_secs(0.0).is_err());
        assert!(timeout_from_secs(-1.0).is_err());
        assert!(timeout_from_secs(std::f64::NAN).is_err());
        assert!(timeout_from_secs(std::f64::INFINITY).is_err());
    }

    #[test]
    fn bind_addresses() {
        assert_eq!(
            parse_bind_address("192.168.1.20").unwrap(),
            Ipv4Addr::new(192, 168, 1, 20)
        );
        assert!(parse_bind_address("::1").is_err());
        assert!(parse_bind_address("localhost").is_err());
    }
}
