use crate::protocol::ErrorCode;

use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

/// Failure of one in-process transfer. Logged by the transfer task, never surfaced
/// to the supervisor.
#[derive(Debug, ThisError)]
pub enum TransferError {
    #[error("Transfer Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transfer Cancelled Error: {message} {location}")]
    Cancelled {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transfer Peer Error: peer sent {code:?}: {message} {location}")]
    Peer {
        code: ErrorCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Transfer Rejected Error: {code:?}: {message} {location}")]
    Rejected {
        code: ErrorCode,
        message: String,
        location: ErrorLocation,
    },

    #[error("Transfer Io Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
