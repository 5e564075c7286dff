//! TFTP wire format (RFC 1350, no option extension).
//!
//! Every datagram starts with a big-endian two-byte opcode. Requests carry a
//! NUL-terminated filename and a NUL-terminated transfer mode; DATA and ACK carry
//! a block number; ERROR carries a code and a NUL-terminated message.

mod packet;

pub use packet::Packet;

use std::fmt;

/// Maximum payload of one DATA packet. A shorter payload ends a transfer.
pub const BLOCK_SIZE: usize = 512;

/// Opcode + block number + full payload.
pub const MAX_PACKET_SIZE: usize = 4 + BLOCK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Opcode {
    ReadRequest = 1,
    WriteRequest = 2,
    Data = 3,
    Ack = 4,
    Error = 5,
}

impl Opcode {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Opcode::ReadRequest),
            2 => Some(Opcode::WriteRequest),
            3 => Some(Opcode::Data),
            4 => Some(Opcode::Ack),
            5 => Some(Opcode::Error),
            _ => None,
        }
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }

    /// Raw leading opcode of a datagram, without validating the rest.
    pub fn peek(datagram: &[u8]) -> Option<u16> {
        match datagram {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    NetAscii,
    Octet,
    Mail,
}

impl TransferMode {
    /// Modes are case-insensitive on the wire.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "netascii" => Some(TransferMode::NetAscii),
            "octet" => Some(TransferMode::Octet),
            "mail" => Some(TransferMode::Mail),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransferMode::NetAscii => "netascii",
            TransferMode::Octet => "octet",
            TransferMode::Mail => "mail",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    NotDefined = 0,
    FileNotFound = 1,
    AccessViolation = 2,
    DiskFull = 3,
    IllegalOperation = 4,
    UnknownTransferId = 5,
    FileAlreadyExists = 6,
    NoSuchUser = 7,
}

impl ErrorCode {
    /// Codes outside the RFC table collapse to `NotDefined`.
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTransferId,
            6 => ErrorCode::FileAlreadyExists,
            7 => ErrorCode::NoSuchUser,
            _ => ErrorCode::NotDefined,
        }
    }
}
