//! One RRQ or WRQ transfer on its own socket.

use crate::error::transfer::TransferError;
use crate::protocol::{BLOCK_SIZE, ErrorCode, MAX_PACKET_SIZE, Packet, TransferMode};

use common::ErrorLocation;

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::fs as TokioFs;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

const RETRANSMIT_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_RETRANSMITS: u32 = 5;

pub(crate) struct TransferContext {
    pub local_ip: IpAddr,
    pub peer: SocketAddr,
    pub root: PathBuf,
    pub token: CancellationToken,
}

/// Map a requested filename onto a path under `root`.
///
/// Only plain relative names are served: absolute paths and any `..`, `.` or
/// prefix component are refused.
pub(crate) fn resolve_in_root(root: &Path, filename: &str) -> Option<PathBuf> {
    let relative = Path::new(filename);

    if relative.as_os_str().is_empty()
        || filename.starts_with(['/', '\\'])
        || !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    Some(root.join(relative))
}

pub(crate) async fn serve_read(context: TransferContext, filename: String, mode: TransferMode) {
    let peer = context.peer;
    match read_transfer(&context, &filename, mode).await {
        Ok(blocks) => info!("Sent {filename} to {peer} ({blocks} blocks)"),
        Err(e) => warn!("Read of {filename} by {peer} failed: {e}"),
    }
}

pub(crate) async fn serve_write(context: TransferContext, filename: String, mode: TransferMode) {
    let peer = context.peer;
    match write_transfer(&context, &filename, mode).await {
        Ok(bytes) => info!("Received {filename} from {peer} ({bytes} bytes)"),
        Err(e) => warn!("Write of {filename} by {peer} failed: {e}"),
    }
}

async fn read_transfer(
    context: &TransferContext,
    filename: &str,
    mode: TransferMode,
) -> Result<u32, TransferError> {
    let session = Session::open(context).await?;

    if mode == TransferMode::Mail {
        return Err(session
            .refuse(ErrorCode::IllegalOperation, "Mail mode is not supported")
            .await);
    }

    let Some(path) = resolve_in_root(&context.root, filename) else {
        return Err(session
            .refuse(ErrorCode::AccessViolation, "Path outside TFTP root")
            .await);
    };

    let data = match TokioFs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(session.refuse(ErrorCode::FileNotFound, "File not found").await);
        }
        Err(e) => {
            debug!("Cannot read {}: {e}", path.display());
            return Err(session
                .refuse(ErrorCode::AccessViolation, "File cannot be read")
                .await);
        }
    };

    let mut block: u16 = 1;
    let mut offset = 0;
    let mut sent = 0;

    loop {
        let end = (offset + BLOCK_SIZE).min(data.len());
        let packet = Packet::Data {
            block,
            payload: data[offset..end].to_vec(),
        }
        .encode();

        session
            .exchange(&packet, |reply| match reply {
                Packet::Ack { block: acked } if acked == block => Some(()),
                _ => None,
            })
            .await?;

        sent += 1;

        if end - offset < BLOCK_SIZE {
            return Ok(sent);
        }

        offset = end;
        block = block.wrapping_add(1);
    }
}

async fn write_transfer(
    context: &TransferContext,
    filename: &str,
    mode: TransferMode,
) -> Result<usize, TransferError> {
    let session = Session::open(context).await?;

    if mode == TransferMode::Mail {
        return Err(session
            .refuse(ErrorCode::IllegalOperation, "Mail mode is not supported")
            .await);
    }

    let Some(path) = resolve_in_root(&context.root, filename) else {
        return Err(session
            .refuse(ErrorCode::AccessViolation, "Path outside TFTP root")
            .await);
    };

    if TokioFs::try_exists(&path).await.unwrap_or(true) {
        return Err(session
            .refuse(ErrorCode::FileAlreadyExists, "File already exists")
            .await);
    }

    let mut contents = Vec::new();
    let mut expected: u16 = 1;
    let mut reply = Packet::Ack { block: 0 }.encode();

    loop {
        let payload = session
            .exchange(&reply, |packet| match packet {
                Packet::Data { block, payload } if block == expected => Some(payload),
                _ => None,
            })
            .await?;

        let last = payload.len() < BLOCK_SIZE;
        contents.extend_from_slice(&payload);
        reply = Packet::Ack { block: expected }.encode();

        if last {
            break;
        }

        expected = expected.wrapping_add(1);
    }

    if let Some(parent) = path.parent()
        && let Err(e) = TokioFs::create_dir_all(parent).await
    {
        debug!("Cannot create {}: {e}", parent.display());
        return Err(session.refuse(ErrorCode::AccessViolation, "Cannot create file").await);
    }

    if let Err(e) = TokioFs::write(&path, &contents).await {
        debug!("Cannot write {}: {e}", path.display());
        return Err(session.refuse(ErrorCode::DiskFull, "Cannot store file").await);
    }

    session.send(&reply).await?;
    Ok(contents.len())
}

struct Session {
    socket: UdpSocket,
    peer: SocketAddr,
    token: CancellationToken,
}

impl Session {
    async fn open(context: &TransferContext) -> Result<Self, TransferError> {
        let socket = UdpSocket::bind((context.local_ip, 0))
            .await
            .map_err(|e| TransferError::Io {
                message: format!("Failed to bind transfer socket: {e}"),
                location: ErrorLocation::caller(),
                source: e,
            })?;

        Ok(Self {
            socket,
            peer: context.peer,
            token: context.token.clone(),
        })
    }

    async fn send(&self, datagram: &[u8]) -> Result<(), TransferError> {
        self.socket
            .send_to(datagram, self.peer)
            .await
            .map(|_| ())
            .map_err(|e| TransferError::Io {
                message: format!("Failed to send to {}: {e}", self.peer),
                location: ErrorLocation::caller(),
                source: e,
            })
    }

    /// Send an ERROR to the peer and return the matching rejection.
    #[track_caller]
    fn refuse(
        &self,
        code: ErrorCode,
        message: &'static str,
    ) -> impl Future<Output = TransferError> + '_ {
        let location = ErrorLocation::caller();
        async move {
            let packet = Packet::error(code, message).encode();
            if let Err(e) = self.send(&packet).await {
                debug!("Could not deliver ERROR to {}: {e}", self.peer);
            }
            TransferError::Rejected {
                code,
                message: message.to_string(),
                location,
            }
        }
    }

    /// Send `datagram` until the peer answers with a packet `accept` recognises.
    ///
    /// Unrecognised packets from the peer (duplicate ACKs, stale DATA) are
    /// ignored without retransmitting. Packets from other sources get an
    /// unknown-transfer-ID ERROR and do not disturb the transfer.
    async fn exchange<T, F>(&self, datagram: &[u8], accept: F) -> Result<T, TransferError>
    where
        F: Fn(Packet) -> Option<T>,
    {
        let mut buf = [0u8; MAX_PACKET_SIZE];

        for attempt in 0..=MAX_RETRANSMITS {
            if attempt > 0 {
                trace!("Retransmitting to {} (attempt {attempt})", self.peer);
            }
            self.send(datagram).await?;

            let deadline = Instant::now() + RETRANSMIT_TIMEOUT;

            loop {
                let received = tokio::select! {
                    _ = self.token.cancelled() => {
                        return Err(TransferError::Cancelled {
                            message: format!("Transfer with {} cancelled", self.peer),
                            location: ErrorLocation::caller(),
                        });
                    }
                    received = timeout_at(deadline, self.socket.recv_from(&mut buf)) => received,
                };

                let (len, from) = match received {
                    Err(_) => break,
                    Ok(Err(e)) => {
                        return Err(TransferError::Io {
                            message: format!("Receive from {} failed: {e}", self.peer),
                            location: ErrorLocation::caller(),
                            source: e,
                        });
                    }
                    Ok(Ok(received)) => received,
                };

                if from != self.peer {
                    debug!("Packet from unknown transfer ID {from}");
                    let packet =
                        Packet::error(ErrorCode::UnknownTransferId, "Unknown transfer ID").encode();
                    if let Err(e) = self.socket.send_to(&packet, from).await {
                        debug!("Could not deliver ERROR to {from}: {e}");
                    }
                    continue;
                }

                match Packet::decode(&buf[..len]) {
                    Ok(Packet::Error { code, message }) => {
                        return Err(TransferError::Peer {
                            code,
                            message,
                            location: ErrorLocation::caller(),
                        });
                    }
                    Ok(packet) => match accept(packet) {
                        Some(value) => return Ok(value),
                        None => trace!("Ignoring out-of-sequence packet from {from}"),
                    },
                    Err(e) => trace!("Ignoring undecodable packet from {from}: {e}"),
                }
            }
        }

        Err(TransferError::Timeout {
            message: format!(
                "No answer from {} after {} retransmissions",
                self.peer, MAX_RETRANSMITS
            ),
            location: ErrorLocation::caller(),
        })
    }
}
