use std::time::Duration;

pub const BINDING_REQUEST: u16 = 0x0001;
pub const BINDING_RESPONSE: u16 = 0x0101;

pub const MAPPED_ADDRESS: u16 = 0x0001;
pub const FAMILY_IPV4: u8 = 0x01;

/// Size of the fixed message header: type, length and transaction id.
pub const HEADER_BYTES: usize = 20;
pub const TRANSACTION_ID_BYTES: usize = 16;
pub const RECV_BUF_BYTES: usize = 2048;

/// Port assumed when a server is given without one.
pub const DEFAULT_STUN_PORT: u16 = 3478;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BIND_PORT: u16 = 54320;

/// Public servers tried, in order, when the caller names none.
pub const STUN_SERVERS: [(&str, u16); 6] = [
    ("stun.l.google.com", 19302),
    ("stun1.l.google.com", 19302),
    ("stun2.l.google.com", 19302),
    ("stun3.l.google.com", 19302),
    ("stun4.l.google.com", 19302),
    ("stun.iptel.org", 3478),
];
