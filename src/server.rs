//! Minimal Binding responder for exercising the client without public servers.
//!
//! Answers every IPv4 Binding Request with a MAPPED-ADDRESS holding the
//! requester's source address, or a fixed address when one is configured.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::consts::RECV_BUF_BYTES;
use crate::msg::{decode_binding_request, encode_binding_response, MappedAddress};

pub struct Responder {
    socket: UdpSocket,
    announce: Option<MappedAddress>,
}

impl Responder {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        Ok(Responder {
            socket: UdpSocket::bind(addr)?,
            announce: None,
        })
    }

    /// Reply with `mapped` instead of the observed source address.
    pub fn announce(mut self, mapped: MappedAddress) -> Self {
        self.announce = Some(mapped);
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Handle one datagram. Returns the peer that was answered, if any.
    pub fn serve_one(&self) -> io::Result<Option<SocketAddr>> {
        let mut buf = [0; RECV_BUF_BYTES];
        let (bytes, src) = self.socket.recv_from(&mut buf)?;
        let transaction_id = match decode_binding_request(&buf[..bytes]) {
            Ok(id) => id,
            Err(e) => {
                debug!("Ignoring {} bytes from {}: {}", bytes, src, e);
                return Ok(None);
            }
        };
        let mapped = match (self.announce, src) {
            (Some(mapped), _) => mapped,
            (None, SocketAddr::V4(v4)) => MappedAddress::ipv4(*v4.ip(), v4.port()),
            (None, SocketAddr::V6(_)) => {
                debug!("Ignoring IPv6 requester {}", src);
                return Ok(None);
            }
        };
        self.socket
            .send_to(&encode_binding_response(&transaction_id, &mapped), src)?;
        debug!("Told {} it is {}:{}", src, mapped.ip, mapped.port);
        Ok(Some(src))
    }

    pub fn run(&self) {
        loop {
            if let Err(e) = self.serve_one() {
                error!("STUN responder error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::encode_binding_request;
    use crate::transaction::Transaction;

    #[test]
    fn ignores_anything_but_binding_requests() {
        let responder = Responder::bind("127.0.0.1:0").unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .send_to(b"hello", responder.local_addr().unwrap())
            .unwrap();
        assert_eq!(responder.serve_one().unwrap(), None);
    }

    #[test]
    fn answers_with_source_address() {
        let responder = Responder::bind("127.0.0.1:0").unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        let txn = Transaction::new();
        client
            .send_to(
                &encode_binding_request(txn.id()),
                responder.local_addr().unwrap(),
            )
            .unwrap();
        assert_eq!(
            responder.serve_one().unwrap(),
            Some(client.local_addr().unwrap())
        );

        let mut buf = [0; RECV_BUF_BYTES];
        let (bytes, _) = client.recv_from(&mut buf).unwrap();
        let mapped = txn.complete(&buf[..bytes]).unwrap();
        assert_eq!(mapped.ip, std::net::Ipv4Addr::LOCALHOST);
        assert_eq!(mapped.port, client.local_addr().unwrap().port());
    }
}
