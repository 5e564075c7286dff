use common::ErrorLocation;
use models::BackendAttempt;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServiceError {
    /// Every candidate missed or failed. Non-fatal: callers continue without the service.
    #[error("Unstartable Error: {message} {location}")]
    Unstartable {
        message: String,
        attempts: Vec<BackendAttempt>,
        location: ErrorLocation,
    },

    #[error("Root Setup Error: {message} {location}")]
    RootSetup {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}

impl ServiceError {
    /// Attempt history carried by an `Unstartable` error; empty for other variants.
    pub fn attempts(&self) -> &[BackendAttempt] {
        match self {
            ServiceError::Unstartable { attempts, .. } => attempts,
            ServiceError::RootSetup { .. } => &[],
        }
    }
}
