//! The one value the supervisor keeps for whatever backend is running.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use tokio::process::Child as TokioChild;
use tokio::time::timeout as TokioTimeout;
use tokio_util::sync::CancellationToken;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a started service, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What, if anything, is currently serving TFTP for a supervisor.
#[derive(Debug, Default)]
pub enum ServiceHandle {
    #[default]
    None,
    ExternalProcess(ExternalProcess),
    InProcessTask(InProcessTask),
}

impl ServiceHandle {
    pub fn is_live(&self) -> bool {
        !matches!(self, ServiceHandle::None)
    }

    pub fn id(&self) -> Option<HandleId> {
        match self {
            ServiceHandle::None => None,
            ServiceHandle::ExternalProcess(process) => Some(process.id),
            ServiceHandle::InProcessTask(task) => Some(task.id),
        }
    }

    /// Short human-readable description for status output.
    pub fn describe(&self) -> String {
        match self {
            ServiceHandle::None => String::from("not running"),
            ServiceHandle::ExternalProcess(process) => {
                format!("{} (PID {}): {}", process.backend, process.pid, process.command)
            }
            ServiceHandle::InProcessTask(task) => {
                format!("in-process server on {}", task.local_address)
            }
        }
    }
}

/// An OS process believed to own the listening socket.
#[derive(Debug)]
pub struct ExternalProcess {
    id: HandleId,
    child: TokioChild,
    pid: u32,
    backend: String,
    command: String,
}

impl ExternalProcess {
    pub(crate) fn new(child: TokioChild, backend: &str, command: String) -> Self {
        let pid = child.id().unwrap_or_default();
        Self {
            id: HandleId::next(),
            child,
            pid,
            backend: backend.to_string(),
            command,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// The launched command line, arguments joined by spaces.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Request graceful termination, then force kill once `grace` has elapsed.
    ///
    /// Never fails: every problem is logged and teardown carries on.
    pub(crate) async fn shutdown(mut self, grace: Duration) {
        let pid = self.pid;

        match self.child.try_wait() {
            Ok(Some(status)) => {
                info!("TFTP backend {} (PID {pid}) already exited: {status}", self.backend);
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Could not query TFTP backend (PID {pid}) state: {e}"),
        }

        if request_termination(pid) {
            match TokioTimeout(grace, self.child.wait()).await {
                Ok(Ok(status)) => {
                    info!("TFTP backend {} (PID {pid}) stopped: {status}", self.backend);
                    return;
                }
                Ok(Err(e)) => warn!("Error waiting for TFTP backend (PID {pid}): {e}"),
                Err(_) => warn!(
                    "TFTP backend (PID {pid}) still running after {grace:?}, forcing kill"
                ),
            }
        } else {
            debug!("Graceful termination unavailable for PID {pid}, forcing kill");
        }

        match self.child.kill().await {
            Ok(()) => info!("TFTP backend {} (PID {pid}) killed", self.backend),
            Err(e) => warn!("Error killing TFTP backend (PID {pid}): {e}"),
        }
    }
}

/// A background server task inside this process.
#[derive(Debug)]
pub struct InProcessTask {
    id: HandleId,
    token: CancellationToken,
    local_address: SocketAddr,
}

impl InProcessTask {
    pub(crate) fn new(token: CancellationToken, local_address: SocketAddr) -> Self {
        Self {
            id: HandleId::next(),
            token,
            local_address,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Address the server socket actually bound (resolves port 0).
    pub fn local_address(&self) -> SocketAddr {
        self.local_address
    }

    /// Signal the task to stop. Does not wait for it.
    pub(crate) fn cancel(self) {
        self.token.cancel();
        info!(
            "In-process TFTP server on {} signalled to stop",
            self.local_address
        );
    }
}

/// Send SIGTERM (or the platform equivalent) to `pid`.
///
/// Returns `false` when the process is gone or the platform has no graceful signal.
fn request_termination(pid: u32) -> bool {
    let target = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    match sys.process(target) {
        Some(process) => match process.kill_with(Signal::Term) {
            Some(sent) => {
                debug!("Sent SIGTERM to PID {pid}: success={sent}");
                sent
            }
            None => false,
        },
        None => {
            debug!("Process {pid} not found");
            false
        }
    }
}
