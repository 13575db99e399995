use std::net::{AddrParseError, SocketAddrV4};

use docopt::Docopt;

use crate::config::{self, DiscoveryConfig};
use crate::msg::MappedAddress;
use crate::net::TransportError;

pub const PROBE_USAGE: &'static str = "
STUN External Address Probe

Usage:
  probe [options] [<server>]
  probe (-h | --help)

Arguments:
  server              host or host:port of a STUN server to ask; the port
                      defaults to 3478. Without it the built-in public
                      servers are tried in order.

Options:
  -h --help           Show this screen.
  --timeout <secs>    seconds to wait for each server [default: 5]
  --attempts <n>      how many built-in servers to try [default: 3]
  --bind <addr>       local IPv4 address to send from [default: 0.0.0.0]
  --port <port>       local UDP port to send from [default: 54320]
  --json              print the result as JSON
  -v --verbose        log every attempt
";

pub const RESPONDER_USAGE: &'static str = "
STUN Binding Responder

Usage:
  responder [options]
  responder (-h | --help)

Options:
  -h --help           Show this screen.
  --listen <addr>     address to answer on [default: 0.0.0.0:3478]
  --announce <addr>   testing aid: always answer with this ip:port instead
                      of the requester's address
  -v --verbose        log every request
";

#[derive(Debug, Deserialize)]
pub struct ProbeArgs {
    pub arg_server: Option<String>,
    pub flag_timeout: f64,
    pub flag_attempts: u32,
    pub flag_bind: String,
    pub flag_port: u16,
    pub flag_json: bool,
    pub flag_verbose: bool,
}

impl ProbeArgs {
    pub fn config(&self) -> Result<DiscoveryConfig, TransportError> {
        let mut config = DiscoveryConfig::default()
            .with_timeout(config::timeout_from_secs(self.flag_timeout)?)
            .with_max_attempts(self.flag_attempts)
            .with_bind(config::parse_bind_address(&self.flag_bind)?, self.flag_port);
        if let Some(server) = &self.arg_server {
            config = config.with_server(server.parse()?);
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponderArgs {
    pub flag_listen: String,
    pub flag_announce: Option<String>,
    pub flag_verbose: bool,
}

impl ResponderArgs {
    pub fn announce(&self) -> Result<Option<MappedAddress>, AddrParseError> {
        match &self.flag_announce {
            Some(addr) => {
                let addr: SocketAddrV4 = addr.parse()?;
                Ok(Some(MappedAddress::ipv4(*addr.ip(), addr.port())))
            }
            None => Ok(None),
        }
    }
}

pub fn parse_probe_args() -> ProbeArgs {
    Docopt::new(PROBE_USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit())
}

pub fn parse_responder_args() -> ResponderArgs {
    Docopt::new(RESPONDER_USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::StunServer;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn probe(argv: &[&str]) -> ProbeArgs {
        Docopt::new(PROBE_USAGE)
            .and_then(|d| d.argv(argv.iter()).deserialize())
            .unwrap()
    }

    fn responder(argv: &[&str]) -> ResponderArgs {
        Docopt::new(RESPONDER_USAGE)
            .and_then(|d| d.argv(argv.iter()).deserialize())
            .unwrap()
    }

    #[test]
    fn probe_defaults_match_library_defaults() {
        let args = probe(&["probe"]);
        assert!(args.arg_server.is_none());
        assert!(!args.flag_json);
        assert_eq!(args.config().unwrap(), DiscoveryConfig::default());
    }

    #[test]
    fn probe_with_server_and_flags() {
        let args = probe(&[
            "probe",
            "--timeout",
            "0.5",
            "--bind",
            "127.0.0.1",
            "--port",
            "0",
            "--json",
            "stun.example.org:19302",
        ]);
        assert!(args.flag_json);
        let config = args.config().unwrap();
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.bind_address, Ipv4Addr::LOCALHOST);
        assert_eq!(config.bind_port, 0);
        assert_eq!(
            config.server,
            Some(StunServer::new("stun.example.org", 19302))
        );
    }

    #[test]
    fn probe_rejects_bad_values() {
        assert!(probe(&["probe", "--timeout", "0"]).config().is_err());
        assert!(probe(&["probe", "--bind", "nowhere"]).config().is_err());
        assert!(probe(&["probe", "host:notaport"]).config().is_err());
    }

    #[test]
    fn responder_announce() {
        let args = responder(&["responder", "--announce", "203.0.113.7:12345"]);
        assert_eq!(args.flag_listen, "0.0.0.0:3478");
        assert_eq!(
            args.announce().unwrap(),
            Some(MappedAddress::ipv4(Ipv4Addr::new(203, 0, 113, 7), 12345))
        );
        assert_eq!(responder(&["responder"]).announce().unwrap(), None);
        assert!(responder(&["responder", "--announce", "nope"])
            .announce()
            .is_err());
    }
}
