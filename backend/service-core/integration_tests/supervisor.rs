use crate::helpers::{missing_candidate, test_config};

use service_core::error::service::ServiceError;
use service_core::service::{ServiceHandle, Supervisor};
use service_core::{README_FILE_NAME, SAMPLE_FILE_NAME};

use models::{AttemptOutcome, ServiceConfig};

use std::fs;
use std::net::UdpSocket as StdUdpSocket;
use std::time::Duration;

// ============================================================================
// Supervisor lifecycle tests
// These drive start/stop through the public API with unreachable daemons, so
// every run lands on the in-process server unless a test says otherwise.
// ============================================================================

// ----------------------------------------------------------------------------
// start() - Trial chain and root seeding
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that missing daemons fall through to the in-process server.
///
/// **WHY THIS MATTERS**: CI machines and most Windows hosts have no TFTP daemon. The
/// service must still come up or the TFTP tests in the app cannot run.
///
/// **BUG THIS CATCHES**: Would catch if "program not found" aborts the chain instead of
/// skipping to the next candidate.
#[tokio::test]
async fn given_only_missing_daemons_when_started_then_in_process_server_runs() {
    // GIVEN: Two candidates that cannot be found
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor = Supervisor::with_candidates(
        test_config(temp.path()),
        vec![missing_candidate("first"), missing_candidate("second")],
    );

    // WHEN: Starting
    let handle = supervisor.start().await.expect("fallback should start");

    // THEN: In-process task bound to a real port
    match handle {
        ServiceHandle::InProcessTask(task) => assert_ne!(task.local_address().port(), 0),
        other => panic!("Expected InProcessTask, got {}", other.describe()),
    }
    assert!(supervisor.is_running());
    assert_ne!(supervisor.local_address().unwrap().port(), 0);

    supervisor.stop().await;
}

/// **VALUE**: Verifies that starting seeds the root without touching existing files.
///
/// **WHY THIS MATTERS**: The probe depends on `test_file.txt` existing, but testers put
/// their own payloads in the root and must not lose them on restart.
///
/// **BUG THIS CATCHES**: Would catch seeding that overwrites, or that only runs once per
/// process.
#[tokio::test]
async fn given_root_with_custom_sample_when_started_then_readme_added_and_sample_kept() {
    // GIVEN: A root with a customised sample
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("tftp_root");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(SAMPLE_FILE_NAME), "mine").unwrap();
    let mut supervisor =
        Supervisor::with_candidates(test_config(&root), vec![missing_candidate("absent")]);

    // WHEN: Starting
    supervisor.start().await.unwrap();

    // THEN: Sample untouched, README created
    assert_eq!(fs::read_to_string(root.join(SAMPLE_FILE_NAME)).unwrap(), "mine");
    assert!(root.join(README_FILE_NAME).exists());

    supervisor.stop().await;
}

/// **VALUE**: Verifies that a second start returns the live handle instead of spawning again.
///
/// **WHY THIS MATTERS**: `--with-tftp` combined with a retry must not leave two servers
/// competing for the same port.
///
/// **BUG THIS CATCHES**: Would catch a missing liveness check in `start()`.
#[tokio::test]
async fn given_running_service_when_started_again_then_same_handle_returned() {
    // GIVEN: A started supervisor
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor =
        Supervisor::with_candidates(test_config(temp.path()), vec![missing_candidate("absent")]);
    let first = supervisor.start().await.unwrap().id();

    // WHEN: Starting again
    let second = supervisor.start().await.unwrap().id();

    // THEN: Same handle identity
    assert!(first.is_some());
    assert_eq!(first, second);

    supervisor.stop().await;
}

/// **VALUE**: Verifies that disabling the fallback yields Unstartable with a full history.
///
/// **WHY THIS MATTERS**: The app logs every attempt so users can see which daemon to
/// install. Losing the history makes that message useless.
///
/// **BUG THIS CATCHES**: Would catch attempts being dropped, or the fallback starting
/// even when disabled.
#[tokio::test]
async fn given_fallback_disabled_and_no_daemons_when_started_then_unstartable_with_history() {
    // GIVEN: No daemons, no in-process server
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .with_root_directory(temp.path())
        .with_port(0)
        .with_allow_in_process(false)
        .build()
        .unwrap();
    let mut supervisor = Supervisor::with_candidates(
        config,
        vec![missing_candidate("alpha"), missing_candidate("beta")],
    );

    // WHEN: Starting
    let result = supervisor.start().await;

    // THEN: Unstartable, every step recorded in order
    let error = result.expect_err("start should fail");
    assert!(matches!(error, ServiceError::Unstartable { .. }));
    let names: Vec<&str> = error.attempts().iter().map(|a| a.backend.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "in-process"]);
    assert_eq!(error.attempts()[0].outcome, AttemptOutcome::NotFound);
    assert_eq!(error.attempts()[2].outcome, AttemptOutcome::Disabled);
    assert!(!supervisor.is_running());
}

/// **VALUE**: Verifies that an occupied port surfaces as Unstartable, not a panic.
///
/// **WHY THIS MATTERS**: Port 69 is often held by a system daemon the chain did not start.
/// The app must report and continue.
///
/// **BUG THIS CATCHES**: Would catch a bind failure escaping as a different error or
/// leaving a half-initialised handle behind.
#[tokio::test]
async fn given_port_already_bound_when_started_then_unstartable_with_bind_failure() {
    // GIVEN: A socket holding a loopback port
    let blocker = StdUdpSocket::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .with_root_directory(temp.path())
        .with_port(port)
        .build()
        .unwrap();
    let mut supervisor = Supervisor::with_candidates(config, vec![missing_candidate("absent")]);

    // WHEN: Starting
    let error = supervisor.start().await.expect_err("bind should fail");

    // THEN: Last attempt is the in-process bind failure
    let last = error.attempts().last().unwrap();
    assert_eq!(last.backend, "in-process");
    assert!(matches!(last.outcome, AttemptOutcome::BindFailed(_)));
    assert!(!supervisor.is_running());
}

// ----------------------------------------------------------------------------
// stop() - Teardown
// ----------------------------------------------------------------------------

/// **VALUE**: Verifies that stopping a never-started supervisor is a harmless no-op.
///
/// **BUG THIS CATCHES**: Would catch a panic on an empty handle during Ctrl-C cleanup.
#[tokio::test]
async fn given_nothing_running_when_stopped_then_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let mut supervisor = Supervisor::with_candidates(test_config(temp.path()), Vec::new());

    supervisor.stop().await;
    supervisor.stop().await;

    assert!(!supervisor.is_running());
    assert!(supervisor.local_address().is_none());
}

/// **VALUE**: Verifies that an external daemon is the winner when it exists, and that
/// stop terminates it gracefully.
///
/// **WHY THIS MATTERS**: A spawned daemon left running after the tool exits keeps the
/// port busy for the next run.
///
/// **BUG THIS CATCHES**: Would catch a chain that ignores external candidates, or a stop
/// that forgets the child.
#[cfg(unix)]
#[tokio::test]
async fn given_installed_daemon_when_started_and_stopped_then_process_is_reaped() {
    // GIVEN: `sleep` standing in for a daemon, after a missing one
    let temp = tempfile::tempdir().unwrap();
    let daemon =
        models::BackendCandidate::new("sleeper", "sleep", &["30"], models::HostFamily::Any);
    let mut supervisor = Supervisor::with_candidates(
        test_config(temp.path()),
        vec![missing_candidate("absent"), daemon],
    );

    // WHEN: Starting
    let pid = match supervisor.start().await.unwrap() {
        ServiceHandle::ExternalProcess(process) => {
            assert_eq!(process.backend(), "sleeper");
            assert_eq!(process.command(), "sleep 30");
            process.pid()
        }
        other => panic!("Expected ExternalProcess, got {}", other.describe()),
    };

    // THEN: Stop returns promptly and the process is gone
    let started = std::time::Instant::now();
    supervisor.stop().await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!supervisor.is_running());
    assert!(!process_alive(pid));
}

/// **VALUE**: Verifies that a daemon ignoring SIGTERM is killed after the grace period.
///
/// **WHY THIS MATTERS**: Some daemons trap TERM to flush state. Stop must still finish
/// in bounded time.
///
/// **BUG THIS CATCHES**: Would catch a stop that waits forever, or one that skips the
/// forced kill.
#[cfg(unix)]
#[tokio::test]
async fn given_daemon_ignoring_term_when_stopped_then_killed_after_grace() {
    // GIVEN: A shell that ignores TERM
    let temp = tempfile::tempdir().unwrap();
    let stubborn = models::BackendCandidate::new(
        "stubborn",
        "sh",
        &["-c", "trap '' TERM; while true; do sleep 1; done"],
        models::HostFamily::Any,
    );
    let config = ServiceConfig::builder()
        .with_root_directory(temp.path())
        .with_port(0)
        .with_settle_delay(Duration::from_millis(200))
        .with_stop_grace(Duration::from_millis(300))
        .build()
        .unwrap();
    let mut supervisor = Supervisor::with_candidates(config, vec![stubborn]);
    let pid = match supervisor.start().await.unwrap() {
        ServiceHandle::ExternalProcess(process) => process.pid(),
        other => panic!("Expected ExternalProcess, got {}", other.describe()),
    };

    // WHEN: Stopping
    let started = std::time::Instant::now();
    supervisor.stop().await;
    let elapsed = started.elapsed();

    // THEN: Waited the grace period, then killed
    assert!(elapsed >= Duration::from_millis(300), "Stopped after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "Stopped after {elapsed:?}");
    assert!(!process_alive(pid));
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
        && fs::read_to_string(format!("/proc/{pid}/stat"))
            .map(|stat| !stat.contains(") Z "))
            .unwrap_or(false)
}

/// **VALUE**: Verifies that with `verify_bound`, a daemon that never binds the port is
/// discarded and the chain moves on.
///
/// **WHY THIS MATTERS**: A daemon that starts but fails to bind (port taken, bad flags)
/// would otherwise be reported as a working service.
///
/// **BUG THIS CATCHES**: Would catch the bound check being skipped, or the rejected
/// process being left running.
#[cfg(unix)]
#[tokio::test]
async fn given_verify_bound_and_daemon_without_socket_when_started_then_falls_through() {
    // GIVEN: `sleep` never opens a UDP socket
    let temp = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .with_root_directory(temp.path())
        .with_port(0)
        .with_settle_delay(Duration::from_millis(50))
        .with_verify_bound(true)
        .build()
        .unwrap();
    let idle = models::BackendCandidate::new("idle", "sleep", &["30"], models::HostFamily::Any);
    let mut supervisor = Supervisor::with_candidates(config, vec![idle]);

    // WHEN: Starting
    let handle = supervisor.start().await.unwrap();

    // THEN: The in-process server won
    assert!(
        matches!(handle, ServiceHandle::InProcessTask(_)),
        "Expected InProcessTask, got {}",
        handle.describe()
    );

    supervisor.stop().await;
}
