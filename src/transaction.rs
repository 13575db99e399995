use thiserror::Error;

use crate::consts::{HEADER_BYTES, MAPPED_ADDRESS, TRANSACTION_ID_BYTES};
use crate::msg::{
    self, decode_binding_response, decode_mapped_address, BindingResponse, DecodeError,
    MappedAddress, TransactionId,
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("response carries no MAPPED-ADDRESS")]
    NoMappedAddress,
}

/// Draw a fresh id from the thread-local CSPRNG.
pub fn new_transaction() -> TransactionId {
    let bytes: [u8; TRANSACTION_ID_BYTES] = rand::random();
    TransactionId::new(bytes)
}

/// The first MAPPED-ADDRESS wins; later ones, and every other attribute, are
/// ignored.
pub fn extract_mapped_address(response: &BindingResponse) -> Result<MappedAddress, ProtocolError> {
    for attr in response.attributes() {
        let attr = attr?;
        if attr.attr_type == MAPPED_ADDRESS {
            return Ok(decode_mapped_address(attr.value)?);
        }
    }
    Err(ProtocolError::NoMappedAddress)
}

/// One outstanding Binding Request.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
}

impl Transaction {
    pub fn new() -> Self {
        Transaction {
            id: new_transaction(),
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn request(&self) -> [u8; HEADER_BYTES] {
        msg::encode_binding_request(&self.id)
    }

    /// Accept `datagram` only if it answers this request.
    pub fn complete(&self, datagram: &[u8]) -> Result<MappedAddress, ProtocolError> {
        let response = decode_binding_response(datagram, &self.id)?;
        extract_mapped_address(&response)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
