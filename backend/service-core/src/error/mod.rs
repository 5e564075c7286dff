pub mod config;
pub mod protocol;
pub mod service;
pub mod transfer;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Service(#[from] service::ServiceError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),
}
