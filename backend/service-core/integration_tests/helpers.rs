//! Test helpers for service integration tests.
//!
//! This module provides utilities for:
//! - Building a loopback, ephemeral-port service config over a temp root
//! - Candidates that can never be found on the host
//! - A minimal TFTP client for driving the in-process server

use models::{BackendCandidate, HostFamily, ServiceConfig};

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Program name no test machine has installed.
pub const MISSING_PROGRAM: &str = "xfer-missing-tftpd-binary";

const CLIENT_TIMEOUT: Duration = Duration::from_secs(3);

/// Test helper: config on 127.0.0.1, port 0, short delays.
pub fn test_config(root: &Path) -> ServiceConfig {
    ServiceConfig::builder()
        .with_root_directory(root)
        .with_port(0)
        .with_settle_delay(Duration::from_millis(50))
        .with_stop_grace(Duration::from_millis(300))
        .with_probe_timeout(Duration::from_millis(500))
        .build()
        .expect("test config should be valid")
}

/// Test helper: a candidate whose program does not exist.
pub fn missing_candidate(name: &str) -> BackendCandidate {
    BackendCandidate::new(name, MISSING_PROGRAM, &["{root}"], HostFamily::Any)
}

/// Test helper: download `filename`, acknowledging every block.
///
/// Returns the file body, or the ERROR code and message the server sent.
pub async fn download(server: SocketAddr, filename: &str) -> Result<Vec<u8>, (u16, String)> {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut request = vec![0x00, 0x01];
    request.extend_from_slice(filename.as_bytes());
    request.push(0);
    request.extend_from_slice(b"octet\0");
    socket.send_to(&request, server).await.unwrap();

    let mut body = Vec::new();
    let mut expected: u16 = 1;
    let mut buf = [0u8; 1024];

    loop {
        let (len, from) = timeout(CLIENT_TIMEOUT, socket.recv_from(&mut buf))
            .await
            .expect("server should answer")
            .unwrap();
        let packet = &buf[..len];

        match u16::from_be_bytes([packet[0], packet[1]]) {
            3 => {
                let block = u16::from_be_bytes([packet[2], packet[3]]);
                if block == expected {
                    body.extend_from_slice(&packet[4..]);
                    expected = expected.wrapping_add(1);
                }
                let mut ack = vec![0x00, 0x04];
                ack.extend_from_slice(&block.to_be_bytes());
                socket.send_to(&ack, from).await.unwrap();

                if len - 4 < 512 {
                    return Ok(body);
                }
            }
            5 => return Err(parse_error(packet)),
            other => panic!("Unexpected opcode {other} during download"),
        }
    }
}

/// Test helper: upload `contents` as `filename`.
pub async fn upload(
    server: SocketAddr,
    filename: &str,
    contents: &[u8],
) -> Result<(), (u16, String)> {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut request = vec![0x00, 0x02];
    request.extend_from_slice(filename.as_bytes());
    request.push(0);
    request.extend_from_slice(b"octet\0");
    socket.send_to(&request, server).await.unwrap();

    let mut buf = [0u8; 1024];
    let (len, peer) = timeout(CLIENT_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("server should answer")
        .unwrap();
    expect_ack(&buf[..len], 0)?;

    let mut chunks: Vec<&[u8]> = contents.chunks(512).collect();
    if contents.len() % 512 == 0 {
        chunks.push(&[]);
    }

    for (index, chunk) in chunks.iter().enumerate() {
        let block = (index + 1) as u16;
        let mut data = vec![0x00, 0x03];
        data.extend_from_slice(&block.to_be_bytes());
        data.extend_from_slice(chunk);
        socket.send_to(&data, peer).await.unwrap();

        let (len, _) = timeout(CLIENT_TIMEOUT, socket.recv_from(&mut buf))
            .await
            .expect("server should acknowledge")
            .unwrap();
        expect_ack(&buf[..len], block)?;
    }

    Ok(())
}

fn expect_ack(packet: &[u8], block: u16) -> Result<(), (u16, String)> {
    match u16::from_be_bytes([packet[0], packet[1]]) {
        4 => {
            assert_eq!(u16::from_be_bytes([packet[2], packet[3]]), block);
            Ok(())
        }
        5 => Err(parse_error(packet)),
        other => panic!("Unexpected opcode {other} during upload"),
    }
}

fn parse_error(packet: &[u8]) -> (u16, String) {
    let code = u16::from_be_bytes([packet[2], packet[3]]);
    let message = String::from_utf8_lossy(&packet[4..])
        .trim_end_matches('\0')
        .to_string();
    (code, message)
}
