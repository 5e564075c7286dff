use crate::helpers::{missing_candidate, test_config};

use service_core::SAMPLE_FILE_NAME;
use service_core::service::{Supervisor, probe};

use models::ProbeFailure;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;

// ============================================================================
// probe() - Liveness check tests
// ============================================================================

/// **VALUE**: Verifies the probe reports success against a live in-process server.
///
/// **WHY THIS MATTERS**: `--test-tftp` is the user's only signal that the service works.
///
/// **BUG THIS CATCHES**: Would catch the probe and server disagreeing on request framing
/// or on the address the probe should target.
#[tokio::test]
async fn given_running_fallback_when_probed_for_sample_then_succeeds() {
    // GIVEN: A running in-process server with a seeded root
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor =
        Supervisor::with_candidates(test_config(temp.path()), vec![missing_candidate("absent")]);
    supervisor.start().await.unwrap();
    let address = supervisor.local_address().unwrap();

    // WHEN: Probing
    let result = probe(address, SAMPLE_FILE_NAME, Duration::from_secs(2)).await;

    // THEN: Success with the transfer socket as responder
    assert!(result.success, "Probe should succeed: {result:?}");
    assert!(result.failure_reason.is_none());
    let responder = result.responder_address.unwrap();
    assert_eq!(responder.ip(), address.ip());

    supervisor.stop().await;
}

/// **VALUE**: Verifies a missing file is reported as a malformed response, not success.
///
/// **WHY THIS MATTERS**: An ERROR reply proves the server is up but cannot serve the
/// sample. Reporting success would hide a broken root.
///
/// **BUG THIS CATCHES**: Would catch a probe that treats any reply as success.
#[tokio::test]
async fn given_running_fallback_when_probed_for_missing_file_then_malformed_response() {
    // GIVEN: A running server
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor =
        Supervisor::with_candidates(test_config(temp.path()), vec![missing_candidate("absent")]);
    supervisor.start().await.unwrap();
    let address = supervisor.local_address().unwrap();

    // WHEN: Probing for a file that does not exist
    let result = probe(address, "no_such_file.bin", Duration::from_secs(2)).await;

    // THEN: MalformedResponse
    assert!(!result.success);
    assert_eq!(result.failure_reason, Some(ProbeFailure::MalformedResponse));

    supervisor.stop().await;
}

/// **VALUE**: Verifies the probe gives up after its timeout when nothing answers.
///
/// **WHY THIS MATTERS**: The probe runs on the CLI's main path; it must never hang.
///
/// **BUG THIS CATCHES**: Would catch a missing timeout around the receive.
#[tokio::test]
async fn given_silent_port_when_probed_then_times_out_after_deadline() {
    // GIVEN: A bound socket that never replies
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = silent.local_addr().unwrap();
    let timeout = Duration::from_millis(300);

    // WHEN: Probing
    let started = Instant::now();
    let result = probe(address, SAMPLE_FILE_NAME, timeout).await;
    let elapsed = started.elapsed();

    // THEN: Timeout close to the deadline
    assert_eq!(result.failure_reason, Some(ProbeFailure::Timeout));
    assert!(elapsed >= timeout, "Returned after {elapsed:?}");
    assert!(elapsed < timeout * 5, "Returned after {elapsed:?}");
}

/// **VALUE**: Verifies a reply with a non-DATA opcode counts as malformed.
///
/// **WHY THIS MATTERS**: A misbehaving daemon replying with garbage is not healthy.
///
/// **BUG THIS CATCHES**: Would catch an opcode check that accepts ACK or ERROR.
#[tokio::test]
async fn given_responder_replying_with_ack_when_probed_then_malformed_response() {
    // GIVEN: A fake server that answers every datagram with ACK 0
    let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address: SocketAddr = fake.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        if let Ok((_, peer)) = fake.recv_from(&mut buf).await {
            let _ = fake.send_to(&[0x00, 0x04, 0x00, 0x00], peer).await;
        }
    });

    // WHEN: Probing
    let result = probe(address, SAMPLE_FILE_NAME, Duration::from_secs(2)).await;

    // THEN: MalformedResponse
    assert_eq!(result.failure_reason, Some(ProbeFailure::MalformedResponse));
    assert!(result.responder_address.is_none());
}

/// **VALUE**: Verifies the probe sends a well-formed octet RRQ.
///
/// **BUG THIS CATCHES**: Would catch framing drift that only an external daemon would
/// notice.
#[tokio::test]
async fn given_fake_server_when_probed_then_receives_octet_read_request() {
    // GIVEN: A fake server that records the request and answers with DATA
    let fake = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let address = fake.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        let (len, peer) = fake.recv_from(&mut buf).await.unwrap();
        fake.send_to(&[0x00, 0x03, 0x00, 0x01, b'h', b'i'], peer)
            .await
            .unwrap();
        buf[..len].to_vec()
    });

    // WHEN: Probing
    let result = probe(address, "pxelinux.0", Duration::from_secs(2)).await;

    // THEN: Success and exact request bytes
    assert!(result.success);
    assert_eq!(result.responder_address, Some(address));
    assert_eq!(server.await.unwrap(), b"\x00\x01pxelinux.0\x00octet\x00".to_vec());
}
