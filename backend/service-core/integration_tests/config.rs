use service_core::DEFAULT_ROOT_DIR_NAME;
use service_core::config::{CONFIG_FILE_NAME, ENV_TFTP_PORT, ENV_TFTP_ROOT, XferConfig};
use service_core::error::config::ConfigError;

use models::HostFamily;

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serial_test::serial;

// ============================================================================
// XferConfig loading tests
// Tests touching XFER_TFTP_* run serially; the environment is process-wide.
// ============================================================================

fn clear_env() {
    // SAFETY: every test that touches these variables is #[serial]
    unsafe {
        std::env::remove_var(ENV_TFTP_PORT);
        std::env::remove_var(ENV_TFTP_ROOT);
    }
}

/// **VALUE**: Verifies a project with no `xfer.toml` gets the documented defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing file being treated as an error, or a
/// default drifting from port 69 on loopback.
#[test]
#[serial]
fn given_no_config_file_when_loaded_then_defaults_apply() {
    // GIVEN: Empty project
    clear_env();
    let project = tempfile::tempdir().unwrap();

    // WHEN: Loading
    let config = XferConfig::load(project.path()).unwrap();
    let service = config.service_config(project.path()).unwrap();

    // THEN: Defaults
    assert_eq!(service.port(), 69);
    assert_eq!(service.bind_address(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(
        service.root_directory(),
        project.path().join(DEFAULT_ROOT_DIR_NAME)
    );
    assert_eq!(service.settle_delay(), Duration::from_secs(1));
    assert!(service.allow_in_process());
    assert!(!service.verify_bound());
    assert!(!config.candidates().is_empty());
}

/// **VALUE**: Verifies every `[tftp]` key and the candidate override are read.
///
/// **WHY THIS MATTERS**: Users pin a daemon or a custom root per project.
///
/// **BUG THIS CATCHES**: Would catch a renamed key silently falling back to a default.
#[test]
#[serial]
fn given_full_config_file_when_loaded_then_values_and_candidates_used() {
    // GIVEN: A project with a full xfer.toml
    clear_env();
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join(CONFIG_FILE_NAME),
        r#"
[tftp]
root = "pxe"
bind_address = "0.0.0.0"
port = 1069
settle_delay_ms = 250
stop_grace_ms = 2000
probe_timeout_ms = 750
allow_in_process = false
verify_bound = true

[[tftp.candidates]]
name = "custom"
program = "my-tftpd"
args = ["--root", "{root}"]
host = "unix"
"#,
    )
    .unwrap();

    // WHEN: Loading
    let config = XferConfig::load(project.path()).unwrap();
    let service = config.service_config(project.path()).unwrap();
    let candidates = config.candidates();

    // THEN: Everything from the file
    assert_eq!(service.root_directory(), project.path().join("pxe"));
    assert_eq!(service.port(), 1069);
    assert_eq!(service.bind_address(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(service.probe_address().ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(service.settle_delay(), Duration::from_millis(250));
    assert_eq!(service.stop_grace(), Duration::from_secs(2));
    assert_eq!(service.probe_timeout(), Duration::from_millis(750));
    assert!(!service.allow_in_process());
    assert!(service.verify_bound());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].program, "my-tftpd");
    assert_eq!(candidates[0].args, vec!["--root", "{root}"]);
    assert_eq!(candidates[0].host, HostFamily::Unix);
}

/// **VALUE**: Verifies broken files and invalid values are errors, not defaults.
///
/// **BUG THIS CATCHES**: Would catch parse failures being swallowed, or a zero probe
/// timeout that would make every probe fail instantly.
#[test]
#[serial]
fn given_invalid_config_files_when_loaded_then_errors_returned() {
    clear_env();

    // GIVEN/WHEN/THEN: Malformed TOML
    let broken = tempfile::tempdir().unwrap();
    fs::write(broken.path().join(CONFIG_FILE_NAME), "[tftp\nport = ").unwrap();
    assert!(matches!(
        XferConfig::load(broken.path()),
        Err(ConfigError::ParseError { .. })
    ));

    // GIVEN/WHEN/THEN: Zero probe timeout
    let zero = tempfile::tempdir().unwrap();
    fs::write(
        zero.path().join(CONFIG_FILE_NAME),
        "[tftp]\nprobe_timeout_ms = 0\n",
    )
    .unwrap();
    assert!(matches!(
        XferConfig::load(zero.path()),
        Err(ConfigError::ValidationError { .. })
    ));

    // GIVEN/WHEN/THEN: Unparseable bind address surfaces at service_config()
    let bad_bind = tempfile::tempdir().unwrap();
    fs::write(
        bad_bind.path().join(CONFIG_FILE_NAME),
        "[tftp]\nbind_address = \"not-an-ip\"\n",
    )
    .unwrap();
    let config = XferConfig::load(bad_bind.path()).unwrap();
    assert!(matches!(
        config.service_config(bad_bind.path()),
        Err(ConfigError::ValidationError { .. })
    ));
}

/// **VALUE**: Verifies environment variables override the file.
///
/// **WHY THIS MATTERS**: CI runs without root privileges and moves the port off 69
/// through the environment.
///
/// **BUG THIS CATCHES**: Would catch overrides applied before the file is read, or an
/// invalid port silently ignored.
#[test]
#[serial]
fn given_env_overrides_when_loaded_then_env_wins_and_bad_port_errors() {
    // GIVEN: File with port 1069, env with 6969 and an absolute root
    clear_env();
    let project = tempfile::tempdir().unwrap();
    let other_root = tempfile::tempdir().unwrap();
    fs::write(project.path().join(CONFIG_FILE_NAME), "[tftp]\nport = 1069\n").unwrap();
    unsafe {
        std::env::set_var(ENV_TFTP_PORT, "6969");
        std::env::set_var(ENV_TFTP_ROOT, other_root.path());
    }

    // WHEN: Loading
    let config = XferConfig::load(project.path()).unwrap();

    // THEN: Env values win
    assert_eq!(config.tftp.port, 6969);
    assert_eq!(config.root_directory(project.path()), other_root.path());

    // WHEN: Port is not a number
    unsafe {
        std::env::set_var(ENV_TFTP_PORT, "sixty-nine");
    }
    let result = XferConfig::load(project.path());

    // THEN: EnvironmentError naming the variable
    match result {
        Err(ConfigError::EnvironmentError { variable, .. }) => assert_eq!(variable, ENV_TFTP_PORT),
        other => panic!("Expected EnvironmentError, got {other:?}"),
    }

    clear_env();
}

/// **VALUE**: Verifies a project `.env` feeds the overrides without beating real env vars.
///
/// **BUG THIS CATCHES**: Would catch `.env` being ignored, or overriding variables the
/// shell already set.
#[test]
#[serial]
fn given_dotenv_file_when_loaded_then_port_taken_from_it() {
    // GIVEN: .env with a port
    clear_env();
    let project = tempfile::tempdir().unwrap();
    fs::write(project.path().join(".env"), format!("{ENV_TFTP_PORT}=2069\n")).unwrap();

    // WHEN: Loading
    let config = XferConfig::load(project.path()).unwrap();

    // THEN: Port from .env
    assert_eq!(config.tftp.port, 2069);

    clear_env();
}
