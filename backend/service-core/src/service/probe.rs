//! Liveness probe: one read request, one reply, opcode check only.

use crate::protocol::{MAX_PACKET_SIZE, Opcode, Packet, TransferMode};

use models::{ProbeFailure, ProbeResult};

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio::time::timeout as TokioTimeout;

/// Send an RRQ for `filename` to `address` and classify the first reply.
///
/// The transfer is never continued: no ACK is sent, so the server will time
/// out on its side.
///
/// # Returns
///
/// * `success=true` - First reply was a DATA packet; `responder_address` is its source
/// * `Timeout` - Nothing arrived within `timeout`
/// * `MalformedResponse` - A reply arrived with any other opcode (ERROR included)
/// * `SocketError` - Local bind, send or receive failed
pub async fn probe(address: SocketAddr, filename: &str, timeout: Duration) -> ProbeResult {
    let request = Packet::read_request(filename, TransferMode::Octet).encode();

    let local: SocketAddr = if address.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = match UdpSocket::bind(local).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("TFTP probe could not bind a local socket: {e}");
            return ProbeResult::failed(ProbeFailure::SocketError);
        }
    };

    debug!("Probing {address} with RRQ {filename}");

    if let Err(e) = socket.send_to(&request, address).await {
        warn!("TFTP probe send to {address} failed: {e}");
        return ProbeResult::failed(ProbeFailure::SocketError);
    }

    let mut buf = [0u8; MAX_PACKET_SIZE];

    match TokioTimeout(timeout, socket.recv_from(&mut buf)).await {
        Err(_) => {
            warn!("TFTP server at {address} not responding (timeout after {timeout:?})");
            ProbeResult::failed(ProbeFailure::Timeout)
        }
        Ok(Err(e)) => {
            warn!("TFTP probe receive from {address} failed: {e}");
            ProbeResult::failed(ProbeFailure::SocketError)
        }
        Ok(Ok((len, from))) => match Opcode::peek(&buf[..len]) {
            Some(opcode) if opcode == Opcode::Data as u16 => {
                info!("TFTP server is responding correctly: DATA from {from}");
                ProbeResult::answered(from)
            }
            other => {
                warn!("Unexpected TFTP response from {from}: opcode {other:?}");
                ProbeResult::failed(ProbeFailure::MalformedResponse)
            }
        },
    }
}
