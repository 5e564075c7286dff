use super::{
    DEFAULT_BIND_ADDRESS, DEFAULT_PROBE_TIMEOUT, DEFAULT_SETTLE_DELAY, DEFAULT_STOP_GRACE,
    DEFAULT_TFTP_PORT, ServiceConfig,
};
use crate::error::ModelError;

use common::ErrorLocation;

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Builder for creating validated [`ServiceConfig`] instances.
///
/// Only the root directory is mandatory; everything else has a default.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    root_directory: Option<PathBuf>,
    bind_address: Option<String>,
    port: Option<u16>,
    settle_delay: Option<Duration>,
    stop_grace: Option<Duration>,
    probe_timeout: Option<Duration>,
    allow_in_process: Option<bool>,
    verify_bound: Option<bool>,
}

impl ServiceConfigBuilder {
    pub fn with_root_directory(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_directory = Some(root.into());
        self
    }

    pub fn with_bind_address(mut self, address: impl Into<String>) -> Self {
        self.bind_address = Some(address.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = Some(grace);
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn with_allow_in_process(mut self, allow: bool) -> Self {
        self.allow_in_process = Some(allow);
        self
    }

    pub fn with_verify_bound(mut self, verify: bool) -> Self {
        self.verify_bound = Some(verify);
        self
    }

    /// Build the ServiceConfig with validation.
    #[track_caller]
    pub fn build(self) -> Result<ServiceConfig, ModelError> {
        let root_directory = self.root_directory.ok_or_else(|| ModelError::Validation {
            message: String::from("Root directory is required"),
            location: ErrorLocation::caller(),
        })?;

        if root_directory.as_os_str().is_empty() {
            return Err(ModelError::Validation {
                message: String::from("Root directory cannot be empty"),
                location: ErrorLocation::caller(),
            });
        }

        let bind_text = self
            .bind_address
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let bind_address: IpAddr = bind_text.trim().parse().map_err(|e| ModelError::Validation {
            message: format!("Invalid bind address '{bind_text}': {e}"),
            location: ErrorLocation::caller(),
        })?;

        let probe_timeout = self.probe_timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);

        if probe_timeout.is_zero() {
            return Err(ModelError::Validation {
                message: String::from("Probe timeout must be greater than zero"),
                location: ErrorLocation::caller(),
            });
        }

        Ok(ServiceConfig {
            root_directory,
            bind_address,
            port: self.port.unwrap_or(DEFAULT_TFTP_PORT),
            settle_delay: self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY),
            stop_grace: self.stop_grace.unwrap_or(DEFAULT_STOP_GRACE),
            probe_timeout,
            allow_in_process: self.allow_in_process.unwrap_or(true),
            verify_bound: self.verify_bound.unwrap_or(false),
        })
    }
}
