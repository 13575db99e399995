//! RFC 3489 Binding messages: the fixed 20 byte header, the attribute walk and
//! the MAPPED-ADDRESS value. Nothing in here touches a socket.

use std::net::Ipv4Addr;

use byteorder::{ByteOrder, NetworkEndian};
use thiserror::Error;

use crate::consts::{
    BINDING_REQUEST, BINDING_RESPONSE, FAMILY_IPV4, HEADER_BYTES, MAPPED_ADDRESS,
    TRANSACTION_ID_BYTES,
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("message is shorter than its header or declared length")]
    Truncated,
    #[error("unexpected message type {0:#06x}")]
    UnexpectedMessageType(u16),
    #[error("transaction id does not match the outstanding request")]
    TransactionMismatch,
    #[error("attribute runs past the end of the message")]
    MalformedAttribute,
    #[error("unsupported address family {0:#04x}")]
    UnsupportedFamily(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; TRANSACTION_ID_BYTES]);

impl TransactionId {
    pub fn new(bytes: [u8; TRANSACTION_ID_BYTES]) -> Self {
        TransactionId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TRANSACTION_ID_BYTES] {
        &self.0
    }

    fn from_slice(bytes: &[u8]) -> Self {
        let mut id = [0; TRANSACTION_ID_BYTES];
        id.copy_from_slice(bytes);
        TransactionId(id)
    }
}

/// Lay out a Binding Request. Requests never carry attributes, so the length
/// field is always zero.
pub fn encode_binding_request(transaction_id: &TransactionId) -> [u8; HEADER_BYTES] {
    let mut buf = [0; HEADER_BYTES];
    NetworkEndian::write_u16(&mut buf[0..2], BINDING_REQUEST);
    NetworkEndian::write_u16(&mut buf[2..4], 0);
    buf[4..HEADER_BYTES].copy_from_slice(transaction_id.as_bytes());
    buf
}

/// Pull the transaction id out of a Binding Request, as a responder would.
pub fn decode_binding_request(datagram: &[u8]) -> Result<TransactionId, DecodeError> {
    if datagram.len() < HEADER_BYTES {
        return Err(DecodeError::Truncated);
    }
    let message_type = NetworkEndian::read_u16(&datagram[0..2]);
    if message_type != BINDING_REQUEST {
        return Err(DecodeError::UnexpectedMessageType(message_type));
    }
    Ok(TransactionId::from_slice(&datagram[4..HEADER_BYTES]))
}

/// A Binding Response borrowed from the receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct BindingResponse<'a> {
    pub message_type: u16,
    pub message_length: u16,
    pub transaction_id: TransactionId,
    attribute_bytes: &'a [u8],
}

impl<'a> BindingResponse<'a> {
    /// Walk the attribute section from the start. Each call begins a fresh walk.
    pub fn attributes(&self) -> Attributes<'a> {
        iterate_attributes(self.attribute_bytes)
    }

    pub fn attribute_bytes(&self) -> &'a [u8] {
        self.attribute_bytes
    }
}

/// Validate the header of `datagram` against the request it should answer.
///
/// Only the first `20 + message_length` bytes are considered; anything the
/// socket handed us past that is ignored.
pub fn decode_binding_response<'a>(
    datagram: &'a [u8],
    expected: &TransactionId,
) -> Result<BindingResponse<'a>, DecodeError> {
    if datagram.len() < HEADER_BYTES {
        return Err(DecodeError::Truncated);
    }
    let message_type = NetworkEndian::read_u16(&datagram[0..2]);
    if message_type != BINDING_RESPONSE {
        return Err(DecodeError::UnexpectedMessageType(message_type));
    }
    if &datagram[4..HEADER_BYTES] != expected.as_bytes() {
        return Err(DecodeError::TransactionMismatch);
    }
    let message_length = NetworkEndian::read_u16(&datagram[2..4]);
    let end = HEADER_BYTES + message_length as usize;
    let attribute_bytes = datagram
        .get(HEADER_BYTES..end)
        .ok_or(DecodeError::Truncated)?;
    Ok(BindingResponse {
        message_type,
        message_length,
        transaction_id: *expected,
        attribute_bytes,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub attr_type: u16,
    /// The value without its trailing padding.
    pub value: &'a [u8],
    /// Start of this attribute's header within the attribute section.
    pub offset: usize,
}

pub fn iterate_attributes(bytes: &[u8]) -> Attributes<'_> {
    Attributes { bytes, pos: 0 }
}

/// Lazy walk over TLV attributes. Yields `MalformedAttribute` at most once,
/// then stops.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Result<Attribute<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let offset = self.pos;
        let rest = &self.bytes[offset..];
        if rest.len() < 4 {
            self.pos = self.bytes.len();
            return Some(Err(DecodeError::MalformedAttribute));
        }
        let attr_type = NetworkEndian::read_u16(&rest[0..2]);
        let value_length = NetworkEndian::read_u16(&rest[2..4]) as usize;
        let value = match rest.get(4..4 + value_length) {
            Some(value) => value,
            None => {
                self.pos = self.bytes.len();
                return Some(Err(DecodeError::MalformedAttribute));
            }
        };
        // Padding may be cut short on the last attribute; only the value must fit.
        self.pos = std::cmp::min(offset + 4 + padded(value_length), self.bytes.len());
        Some(Ok(Attribute {
            attr_type,
            value,
            offset,
        }))
    }
}

impl<'a> std::iter::FusedIterator for Attributes<'a> {}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedAddress {
    pub family: u8,
    pub port: u16,
    pub ip: Ipv4Addr,
}

impl MappedAddress {
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        MappedAddress {
            family: FAMILY_IPV4,
            port,
            ip,
        }
    }
}

pub fn decode_mapped_address(value: &[u8]) -> Result<MappedAddress, DecodeError> {
    if value.len() < 8 {
        return Err(DecodeError::MalformedAttribute);
    }
    let family = value[1];
    if family != FAMILY_IPV4 {
        return Err(DecodeError::UnsupportedFamily(family));
    }
    Ok(MappedAddress {
        family,
        port: NetworkEndian::read_u16(&value[2..4]),
        ip: Ipv4Addr::new(value[4], value[5], value[6], value[7]),
    })
}

/// Lay out a Binding Response carrying a single MAPPED-ADDRESS.
pub fn encode_binding_response(transaction_id: &TransactionId, mapped: &MappedAddress) -> Vec<u8> {
    let mut buf = vec![0; HEADER_BYTES + 12];
    NetworkEndian::write_u16(&mut buf[0..2], BINDING_RESPONSE);
    NetworkEndian::write_u16(&mut buf[2..4], 12);
    buf[4..HEADER_BYTES].copy_from_slice(transaction_id.as_bytes());

    let attr = &mut buf[HEADER_BYTES..];
    NetworkEndian::write_u16(&mut attr[0..2], MAPPED_ADDRESS);
    NetworkEndian::write_u16(&mut attr[2..4], 8);
    attr[5] = mapped.family;
    NetworkEndian::write_u16(&mut attr[6..8], mapped.port);
    attr[8..12].copy_from_slice(&mapped.ip.octets());
    buf
}
