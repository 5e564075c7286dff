use crate::helpers::{download, missing_candidate, test_config, upload};

use service_core::service::{Supervisor, probe};
use service_core::{SAMPLE_FILE_BODY, SAMPLE_FILE_NAME};

use models::ProbeFailure;

use std::fs;
use std::time::Duration;

// ============================================================================
// In-process server transfer tests
// A small client drives full RRQ/WRQ exchanges against the fallback server.
// ============================================================================

async fn started(root: &std::path::Path) -> Supervisor {
    let mut supervisor =
        Supervisor::with_candidates(test_config(root), vec![missing_candidate("absent")]);
    supervisor.start().await.unwrap();
    supervisor
}

/// **VALUE**: Verifies a read of the seeded sample returns its exact body.
///
/// **BUG THIS CATCHES**: Would catch a server that serves the wrong root or truncates.
#[tokio::test]
async fn given_seeded_root_when_sample_downloaded_then_body_matches() {
    // GIVEN: A running fallback server
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor = started(temp.path()).await;

    // WHEN: Downloading the sample
    let body = download(supervisor.local_address().unwrap(), SAMPLE_FILE_NAME)
        .await
        .unwrap();

    // THEN: Seeded content
    assert_eq!(body, SAMPLE_FILE_BODY.as_bytes());

    supervisor.stop().await;
}

/// **VALUE**: Verifies multi-block reads, including a file that is an exact multiple of
/// 512 bytes and therefore needs a trailing empty block.
///
/// **WHY THIS MATTERS**: Boot images are megabytes; the block loop is where TFTP servers
/// usually break.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one that drops the last block or never
/// sends the empty terminator.
#[tokio::test]
async fn given_multi_block_files_when_downloaded_then_all_blocks_arrive() {
    // GIVEN: Files of 1300 and 1024 bytes
    let temp = tempfile::tempdir().unwrap();
    let odd: Vec<u8> = (0..1300u32).map(|i| (i % 251) as u8).collect();
    let exact: Vec<u8> = (0..1024u32).map(|i| (i % 7) as u8).collect();
    fs::write(temp.path().join("odd.bin"), &odd).unwrap();
    fs::create_dir_all(temp.path().join("boot")).unwrap();
    fs::write(temp.path().join("boot").join("exact.bin"), &exact).unwrap();
    let mut supervisor = started(temp.path()).await;
    let address = supervisor.local_address().unwrap();

    // WHEN: Downloading both
    let got_odd = download(address, "odd.bin").await.unwrap();
    let got_exact = download(address, "boot/exact.bin").await.unwrap();

    // THEN: Byte-identical
    assert_eq!(got_odd, odd);
    assert_eq!(got_exact, exact);

    supervisor.stop().await;
}

/// **VALUE**: Verifies traversal and missing files are answered with the right ERROR codes.
///
/// **WHY THIS MATTERS**: The server may listen beyond loopback; `..` must never escape.
///
/// **BUG THIS CATCHES**: Would catch traversal being served, or wrong error codes
/// confusing clients.
#[tokio::test]
async fn given_bad_filenames_when_downloaded_then_error_codes_returned() {
    // GIVEN: A file next to the root that must stay private
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("tftp_root");
    fs::write(temp.path().join("secret.txt"), "private").unwrap();
    let mut supervisor = started(&root).await;
    let address = supervisor.local_address().unwrap();

    // WHEN: Requesting outside the root, by absolute path and a missing file
    let traversal = download(address, "../secret.txt").await;
    let absolute = download(address, "/etc/hostname").await;
    let missing = download(address, "absent.txt").await;

    // THEN: AccessViolation (2) twice and FileNotFound (1)
    assert_eq!(traversal.unwrap_err().0, 2);
    assert_eq!(absolute.unwrap_err().0, 2);
    assert_eq!(missing.unwrap_err().0, 1);

    supervisor.stop().await;
}

/// **VALUE**: Verifies uploads are stored and existing files are protected.
///
/// **WHY THIS MATTERS**: Firmware upload tests push files to the service; overwriting an
/// existing file silently would destroy test fixtures.
///
/// **BUG THIS CATCHES**: Would catch lost blocks on write or missing FileAlreadyExists.
#[tokio::test]
async fn given_new_and_existing_names_when_uploaded_then_new_stored_existing_refused() {
    // GIVEN: A running server
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor = started(temp.path()).await;
    let address = supervisor.local_address().unwrap();
    let payload: Vec<u8> = (0..700u32).map(|i| (i % 13) as u8).collect();

    // WHEN: Uploading a new file and over the sample
    let stored = upload(address, "uploads/fw.bin", &payload).await;
    let refused = upload(address, SAMPLE_FILE_NAME, b"overwrite").await;

    // THEN: New file on disk, sample refused with FileAlreadyExists (6)
    assert!(stored.is_ok(), "Upload failed: {stored:?}");
    assert_eq!(fs::read(temp.path().join("uploads").join("fw.bin")).unwrap(), payload);
    assert_eq!(refused.unwrap_err().0, 6);
    assert_eq!(
        fs::read_to_string(temp.path().join(SAMPLE_FILE_NAME)).unwrap(),
        SAMPLE_FILE_BODY
    );

    supervisor.stop().await;
}

/// **VALUE**: Verifies stop actually silences the in-process server.
///
/// **WHY THIS MATTERS**: A server that keeps answering after stop holds the port and
/// makes the next start fail.
///
/// **BUG THIS CATCHES**: Would catch a cancel that never reaches the listening loop.
#[tokio::test]
async fn given_running_fallback_when_stopped_then_probe_times_out() {
    // GIVEN: A running server
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor = started(temp.path()).await;
    let address = supervisor.local_address().unwrap();

    // WHEN: Stopping and letting the task observe cancellation
    supervisor.stop().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // THEN: No answer
    let result = probe(address, SAMPLE_FILE_NAME, Duration::from_millis(300)).await;
    assert!(!result.success);
    assert!(matches!(
        result.failure_reason,
        Some(ProbeFailure::Timeout) | Some(ProbeFailure::SocketError)
    ));
}
