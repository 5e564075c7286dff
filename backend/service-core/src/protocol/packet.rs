use super::{BLOCK_SIZE, ErrorCode, Opcode, TransferMode};
use crate::error::protocol::ProtocolError;

use common::ErrorLocation;

/// A decoded TFTP datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ReadRequest { filename: String, mode: TransferMode },
    WriteRequest { filename: String, mode: TransferMode },
    Data { block: u16, payload: Vec<u8> },
    Ack { block: u16 },
    Error { code: ErrorCode, message: String },
}

impl Packet {
    pub fn read_request(filename: impl Into<String>, mode: TransferMode) -> Self {
        Packet::ReadRequest {
            filename: filename.into(),
            mode,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Packet::Error {
            code,
            message: message.into(),
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::ReadRequest { .. } => Opcode::ReadRequest,
            Packet::WriteRequest { .. } => Opcode::WriteRequest,
            Packet::Data { .. } => Opcode::Data,
            Packet::Ack { .. } => Opcode::Ack,
            Packet::Error { .. } => Opcode::Error,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + BLOCK_SIZE);
        out.extend_from_slice(&self.opcode().to_be_bytes());

        match self {
            Packet::ReadRequest { filename, mode } | Packet::WriteRequest { filename, mode } => {
                push_cstr(&mut out, filename);
                push_cstr(&mut out, mode.as_str());
            }
            Packet::Data { block, payload } => {
                out.extend_from_slice(&block.to_be_bytes());
                out.extend_from_slice(payload);
            }
            Packet::Ack { block } => {
                out.extend_from_slice(&block.to_be_bytes());
            }
            Packet::Error { code, message } => {
                out.extend_from_slice(&(*code as u16).to_be_bytes());
                push_cstr(&mut out, message);
            }
        }

        out
    }

    #[track_caller]
    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        let raw = Opcode::peek(datagram).ok_or_else(|| ProtocolError::Decode {
            message: format!("Datagram too short for an opcode ({} bytes)", datagram.len()),
            location: ErrorLocation::caller(),
        })?;

        let opcode = Opcode::from_u16(raw).ok_or_else(|| ProtocolError::UnknownOpcode {
            opcode: raw,
            location: ErrorLocation::caller(),
        })?;

        let body = &datagram[2..];

        match opcode {
            Opcode::ReadRequest => {
                let (filename, mode) = decode_request(body)?;
                Ok(Packet::ReadRequest { filename, mode })
            }
            Opcode::WriteRequest => {
                let (filename, mode) = decode_request(body)?;
                Ok(Packet::WriteRequest { filename, mode })
            }
            Opcode::Data => {
                let block = decode_block(body)?;
                let payload = &body[2..];
                if payload.len() > BLOCK_SIZE {
                    return Err(ProtocolError::Decode {
                        message: format!(
                            "DATA payload of {} bytes exceeds {BLOCK_SIZE}",
                            payload.len()
                        ),
                        location: ErrorLocation::caller(),
                    });
                }
                Ok(Packet::Data {
                    block,
                    payload: payload.to_vec(),
                })
            }
            Opcode::Ack => Ok(Packet::Ack {
                block: decode_block(body)?,
            }),
            Opcode::Error => {
                let code = decode_block(body)?;
                // Some stacks omit the trailing NUL; accept both.
                let text = body[2..].split(|b| *b == 0).next().unwrap_or_default();
                Ok(Packet::Error {
                    code: ErrorCode::from_u16(code),
                    message: String::from_utf8_lossy(text).into_owned(),
                })
            }
        }
    }
}

fn push_cstr(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
    out.push(0);
}

#[track_caller]
fn decode_block(body: &[u8]) -> Result<u16, ProtocolError> {
    match body {
        [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(ProtocolError::Decode {
            message: String::from("Missing two-byte block number"),
            location: ErrorLocation::caller(),
        }),
    }
}

/// `filename NUL mode NUL`, any trailing option pairs ignored.
#[track_caller]
fn decode_request(body: &[u8]) -> Result<(String, TransferMode), ProtocolError> {
    let mut fields = body.split(|b| *b == 0);

    let filename = fields.next().unwrap_or_default();
    if filename.is_empty() {
        return Err(ProtocolError::Decode {
            message: String::from("Request has an empty filename"),
            location: ErrorLocation::caller(),
        });
    }

    let mode = match fields.next() {
        Some(mode) if body.ends_with(&[0]) => mode,
        _ => {
            return Err(ProtocolError::Decode {
                message: String::from("Request is missing a NUL-terminated mode"),
                location: ErrorLocation::caller(),
            });
        }
    };

    let filename = std::str::from_utf8(filename).map_err(|e| ProtocolError::Decode {
        message: format!("Filename is not valid text: {e}"),
        location: ErrorLocation::caller(),
    })?;

    let mode_text = String::from_utf8_lossy(mode);
    let mode = TransferMode::parse(&mode_text).ok_or_else(|| ProtocolError::Decode {
        message: format!("Unsupported transfer mode '{mode_text}'"),
        location: ErrorLocation::caller(),
    })?;

    Ok((filename.to_string(), mode))
}
