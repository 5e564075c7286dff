//! In-process TFTP server used when no external daemon is installed.
//!
//! The listening socket only accepts requests; each transfer gets its own
//! ephemeral socket (its transfer ID) and runs on a separate task. All tasks
//! share one cancellation token and are never joined.

use crate::error::service::ServiceError;
use crate::protocol::{ErrorCode, Packet};
use crate::service::handle::{InProcessTask, ServiceHandle};
use crate::service::transfer::{TransferContext, serve_read, serve_write};

use common::ErrorLocation;
use models::{AttemptOutcome, BackendAttempt, ServiceConfig};

use std::io::Error as IoError;
use std::net::SocketAddr;
use std::path::PathBuf;

use log::{debug, info, trace, warn};
use tokio::net::UdpSocket;
use tokio::spawn as TokioSpawn;
use tokio_util::sync::CancellationToken;

pub(crate) const IN_PROCESS_BACKEND: &str = "in-process";

/// Large enough for a request carrying option pairs we ignore.
const REQUEST_BUFFER_SIZE: usize = 2048;

/// Bind the server socket and start serving `config.root_directory()` in the background.
///
/// Binding errors (port in use, privileged port) are returned here; once bound,
/// the task runs until its token is cancelled or the process exits.
pub async fn start_in_process(config: &ServiceConfig) -> Result<ServiceHandle, ServiceError> {
    let address = config.socket_address();

    let socket = UdpSocket::bind(address)
        .await
        .map_err(|e| bind_failure(address, e))?;

    let local_address = socket.local_addr().map_err(|e| bind_failure(address, e))?;

    let token = CancellationToken::new();
    let server = FallbackServer {
        socket,
        local_address,
        root: config.root_directory().to_path_buf(),
        token: token.clone(),
    };

    TokioSpawn(server.serve());

    info!(
        "In-process TFTP server listening on {local_address}, serving {}",
        config.root_directory().display()
    );

    Ok(ServiceHandle::InProcessTask(InProcessTask::new(
        token,
        local_address,
    )))
}

#[track_caller]
fn bind_failure(address: SocketAddr, error: IoError) -> ServiceError {
    warn!("In-process TFTP server could not bind {address}: {error}");

    ServiceError::Unstartable {
        message: format!("In-process TFTP server could not bind {address}: {error}"),
        attempts: vec![BackendAttempt::new(
            IN_PROCESS_BACKEND,
            format!("bind udp {address}"),
            AttemptOutcome::BindFailed(error.to_string()),
        )],
        location: ErrorLocation::caller(),
    }
}

struct FallbackServer {
    socket: UdpSocket,
    local_address: SocketAddr,
    root: PathBuf,
    token: CancellationToken,
}

impl FallbackServer {
    async fn serve(self) {
        let mut buf = vec![0u8; REQUEST_BUFFER_SIZE];

        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => self.dispatch(&buf[..len], peer).await,
                    Err(e) => warn!("In-process TFTP server receive error: {e}"),
                },
            }
        }

        info!("In-process TFTP server on {} stopped", self.local_address);
    }

    async fn dispatch(&self, datagram: &[u8], peer: SocketAddr) {
        let context = || TransferContext {
            local_ip: self.local_address.ip(),
            peer,
            root: self.root.clone(),
            token: self.token.child_token(),
        };

        match Packet::decode(datagram) {
            Ok(Packet::ReadRequest { filename, mode }) => {
                debug!("RRQ {filename} ({mode}) from {peer}");
                TokioSpawn(serve_read(context(), filename, mode));
            }
            Ok(Packet::WriteRequest { filename, mode }) => {
                debug!("WRQ {filename} ({mode}) from {peer}");
                TokioSpawn(serve_write(context(), filename, mode));
            }
            Ok(Packet::Error { code, message }) => {
                trace!("Ignoring stray ERROR {code:?} from {peer}: {message}");
            }
            Ok(other) => {
                let opcode = other.opcode();
                self.reject(peer, format!("{opcode:?} outside a transfer"))
                    .await;
            }
            Err(e) => {
                debug!("Malformed request from {peer}: {e}");
                self.reject(peer, String::from("Malformed request")).await;
            }
        }
    }

    async fn reject(&self, peer: SocketAddr, message: String) {
        let reply = Packet::error(ErrorCode::IllegalOperation, message).encode();
        if let Err(e) = self.socket.send_to(&reply, peer).await {
            debug!("Failed to send ERROR to {peer}: {e}");
        }
    }
}
