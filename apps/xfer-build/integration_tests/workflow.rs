use xfer_build::cli::Cli;
use xfer_build::steps::{EXIT_FAILURE, EXIT_SUCCESS, PACKAGE_JSON, StepRunner};
use xfer_build::workflow::{execute, run};

use service_core::config::CONFIG_FILE_NAME;
use service_core::service::Supervisor;

use models::{BackendCandidate, HostFamily, ServiceConfig};

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;

// ============================================================================
// Workflow tests
// A project root with package.json and an xfer.toml pinning the TFTP service
// to an unreachable daemon, so --with-tftp always lands in-process.
// ============================================================================

const TEST_CONFIG: &str = r#"
[tftp]
settle_delay_ms = 50
stop_grace_ms = 300
probe_timeout_ms = 300

[[tftp.candidates]]
name = "absent"
program = "xfer-missing-tftpd-binary"
args = ["{root}"]
"#;

fn project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join(PACKAGE_JSON), "{}").unwrap();
    fs::write(temp.path().join(CONFIG_FILE_NAME), TEST_CONFIG).unwrap();
    temp
}

fn cli(root: &Path, args: &[&str]) -> Cli {
    let root = root.to_string_lossy().into_owned();
    let mut argv = vec!["xfer-build", "--root", root.as_str()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse")
}

/// **VALUE**: Verifies a directory without package.json exits with 1.
///
/// **BUG THIS CATCHES**: Would catch the tool running npm in an arbitrary directory.
#[tokio::test]
async fn given_root_without_package_json_when_run_then_exit_failure() {
    let temp = tempfile::tempdir().unwrap();

    assert_eq!(run(cli(temp.path(), &["--build-only"])).await, EXIT_FAILURE);
}

/// **VALUE**: Verifies `--test-tftp` reports a live service as 0 and a silent port as 1.
///
/// **WHY THIS MATTERS**: Scripts gate on this exit code before running transfer tests.
///
/// **BUG THIS CATCHES**: Would catch the CLI port override not reaching the probe, or
/// the probe result being ignored.
#[tokio::test]
async fn given_live_and_silent_ports_when_test_tftp_run_then_exit_codes_differ() {
    // GIVEN: A running in-process service and a silent socket
    let project = project();
    let service_root = tempfile::tempdir().unwrap();
    let config = ServiceConfig::builder()
        .with_root_directory(service_root.path())
        .with_port(0)
        .build()
        .unwrap();
    let mut supervisor = Supervisor::with_candidates(
        config,
        vec![BackendCandidate::new(
            "absent",
            "xfer-missing-tftpd-binary",
            &[],
            HostFamily::Any,
        )],
    );
    supervisor.start().await.unwrap();
    let live_port = supervisor.local_address().unwrap().port().to_string();
    let silent = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let silent_port = silent.local_addr().unwrap().port().to_string();
    let runner = StepRunner::new(project.path()).unwrap();

    // WHEN: Testing both
    let live = execute(
        &cli(project.path(), &["--test-tftp", "--tftp-port", &live_port]),
        &runner,
    )
    .await
    .unwrap();
    let dead = execute(
        &cli(project.path(), &["--test-tftp", "--tftp-port", &silent_port]),
        &runner,
    )
    .await
    .unwrap();

    // THEN: 0 for the live service, 1 for silence
    assert_eq!(live, EXIT_SUCCESS);
    assert_eq!(dead, EXIT_FAILURE);

    supervisor.stop().await;
}

/// **VALUE**: Verifies `--with-tftp` serves during the steps and stops afterwards.
///
/// **WHY THIS MATTERS**: A service left behind keeps the port and fails the next run.
///
/// **BUG THIS CATCHES**: Would catch a missing stop, or the service root not being
/// seeded from the CLI override.
#[cfg(unix)]
#[tokio::test]
async fn given_with_tftp_when_build_only_succeeds_then_service_seeded_and_exit_zero() {
    // GIVEN: Runner backed by `true`, service root override
    let project = project();
    let service_root = project.path().join("custom_root");
    let runner = StepRunner::new(project.path())
        .unwrap()
        .with_program("true");
    let service_root_arg = service_root.to_string_lossy().into_owned();

    // WHEN: Build-only with the service
    let code = execute(
        &cli(
            project.path(),
            &[
                "--with-tftp",
                "--build-only",
                "--tftp-port",
                "0",
                "--tftp-root",
                &service_root_arg,
            ],
        ),
        &runner,
    )
    .await
    .unwrap();

    // THEN: Success and a seeded root
    assert_eq!(code, EXIT_SUCCESS);
    assert!(service_root.join(service_core::SAMPLE_FILE_NAME).exists());
}

/// **VALUE**: Verifies a failing intermediate step ends the run with 1.
///
/// **BUG THIS CATCHES**: Would catch the pipeline carrying on to later steps after a
/// failed install.
#[cfg(unix)]
#[tokio::test]
async fn given_failing_program_when_full_pipeline_run_then_exit_failure() {
    let project = project();
    let runner = StepRunner::new(project.path())
        .unwrap()
        .with_program("false");

    let started = std::time::Instant::now();
    let code = execute(&cli(project.path(), &["--skip-install"]), &runner)
        .await
        .unwrap();

    assert_eq!(code, EXIT_FAILURE);
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// **VALUE**: Verifies a broken xfer.toml stops the run before any step.
#[tokio::test]
async fn given_invalid_config_when_executed_then_config_error() {
    let project = project();
    fs::write(
        project.path().join(CONFIG_FILE_NAME),
        "[tftp]\nprobe_timeout_ms = 0\n",
    )
    .unwrap();
    let runner = StepRunner::new(project.path()).unwrap();

    let result = execute(&cli(project.path(), &["--run-only"]), &runner).await;

    assert!(matches!(
        result,
        Err(xfer_build::error::BuildError::Config { .. })
    ));
}
