use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Opcode Error: {opcode:#06x} {location}")]
    UnknownOpcode { opcode: u16, location: ErrorLocation },
}
