use crate::error::service::ServiceError;
use crate::service::candidates::default_candidates;
use crate::service::chain::run_chain;
use crate::service::handle::ServiceHandle;
use crate::service::root::prepare_root;

use models::{BackendCandidate, HostFamily, ServiceConfig};

use std::mem::take;
use std::net::SocketAddr;

use log::{debug, info, warn};

/// Owns the lifecycle of at most one TFTP service.
///
/// `start()` and `stop()` are idempotent. The supervisor is not shared between
/// tasks; callers drive it sequentially.
#[derive(Debug)]
pub struct Supervisor {
    config: ServiceConfig,
    candidates: Vec<BackendCandidate>,
    host: HostFamily,
    handle: ServiceHandle,
}

impl Supervisor {
    /// Supervisor using the built-in backend list for the current host.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_candidates(config, default_candidates())
    }

    pub fn with_candidates(config: ServiceConfig, candidates: Vec<BackendCandidate>) -> Self {
        Self {
            config,
            candidates,
            host: HostFamily::current(),
            handle: ServiceHandle::None,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn handle(&self) -> &ServiceHandle {
        &self.handle
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_live()
    }

    /// Address clients should use to reach the running service.
    ///
    /// For the in-process server this is the bound socket (port 0 resolved);
    /// for external daemons it is the configured address.
    pub fn local_address(&self) -> Option<SocketAddr> {
        match &self.handle {
            ServiceHandle::None => None,
            ServiceHandle::ExternalProcess(_) => Some(self.config.probe_address()),
            ServiceHandle::InProcessTask(task) => {
                let bound = task.local_address();
                Some(SocketAddr::new(self.config.probe_address().ip(), bound.port()))
            }
        }
    }

    /// Start the service unless one is already live.
    ///
    /// # Returns
    ///
    /// * `Ok(&ServiceHandle)` - The new handle, or the existing one when already running
    /// * `Err(ServiceError::Unstartable)` - Every backend missed; carries the attempt history
    /// * `Err(ServiceError::RootSetup)` - The root directory could not be prepared
    pub async fn start(&mut self) -> Result<&ServiceHandle, ServiceError> {
        if self.handle.is_live() {
            warn!("TFTP server already running: {}", self.handle.describe());
            return Ok(&self.handle);
        }

        info!("Starting TFTP server");
        prepare_root(self.config.root_directory())?;

        let handle = run_chain(&self.config, &self.candidates, self.host).await?;
        info!("TFTP server running: {}", handle.describe());

        self.handle = handle;
        Ok(&self.handle)
    }

    /// Tear down whatever is running. Never fails; problems are logged.
    pub async fn stop(&mut self) {
        match take(&mut self.handle) {
            ServiceHandle::None => debug!("Stop requested but no TFTP server is running"),
            ServiceHandle::ExternalProcess(process) => {
                info!("Stopping TFTP backend {} (PID {})", process.backend(), process.pid());
                process.shutdown(self.config.stop_grace()).await;
            }
            ServiceHandle::InProcessTask(task) => task.cancel(),
        }
    }
}
