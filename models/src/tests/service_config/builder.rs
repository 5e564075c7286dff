use crate::ServiceConfigBuilder;
use crate::error::ModelError;
use crate::service_config::{
    DEFAULT_PROBE_TIMEOUT, DEFAULT_SETTLE_DELAY, DEFAULT_STOP_GRACE, DEFAULT_TFTP_PORT,
};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// **VALUE**: Verifies that only the root directory is required and everything else defaults.
///
/// **WHY THIS MATTERS**: The build binary constructs a config from a mostly empty
/// `xfer.toml`. Defaults must match the documented service contract (port 69, loopback,
/// 1 s settle, 5 s stop grace, 2 s probe timeout).
///
/// **BUG THIS CATCHES**: Would catch if a default drifts, e.g. the grace period shrinking
/// so that daemons are force-killed before they can shut down cleanly.
#[test]
fn given_only_root_when_building_then_applies_service_defaults() {
    // GIVEN: Builder with just a root directory
    let builder = ServiceConfigBuilder::default().with_root_directory("/tmp/tftp_root");

    // WHEN: Building
    let config = builder.build().expect("root-only config should be valid");

    // THEN: Defaults are applied
    assert_eq!(config.port(), DEFAULT_TFTP_PORT);
    assert_eq!(config.bind_address(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.settle_delay(), DEFAULT_SETTLE_DELAY);
    assert_eq!(config.stop_grace(), DEFAULT_STOP_GRACE);
    assert_eq!(config.probe_timeout(), DEFAULT_PROBE_TIMEOUT);
    assert!(config.allow_in_process(), "Fallback should be enabled by default");
    assert!(!config.verify_bound(), "Bound check should be opt-in");
}

/// **VALUE**: Verifies that a missing root directory is rejected.
///
/// **WHY THIS MATTERS**: Every backend serves files from the root. Without one, the
/// supervisor would seed sample files into an arbitrary working directory.
///
/// **BUG THIS CATCHES**: Would catch if the required-field check is removed.
#[test]
fn given_missing_root_when_building_then_returns_validation_error() {
    // GIVEN: Builder without root
    let builder = ServiceConfigBuilder::default().with_port(6969);

    // WHEN: Building
    let result = builder.build();

    // THEN: Validation error naming the root
    match result {
        Err(ModelError::Validation { message, .. }) => {
            assert_eq!(message, "Root directory is required");
        }
        Ok(config) => panic!("Expected validation error, got {config:?}"),
    }
}

/// **VALUE**: Verifies that unparseable bind addresses are rejected up front.
///
/// **WHY THIS MATTERS**: A typo such as `127.0.0.l` would otherwise surface much later as
/// an opaque bind failure in the fallback server.
///
/// **BUG THIS CATCHES**: Would catch if the address is stored as a raw string again.
#[test]
fn given_invalid_bind_address_when_building_then_returns_validation_error() {
    // GIVEN: Garbage bind address
    let builder = ServiceConfigBuilder::default()
        .with_root_directory("/tmp/tftp_root")
        .with_bind_address("127.0.0.l");

    // WHEN: Building
    let result = builder.build();

    // THEN: Validation error mentions the bad value
    let err = result.expect_err("invalid bind address should fail");
    assert!(err.to_string().contains("127.0.0.l"), "Got: {err}");
}

/// **VALUE**: Verifies that a zero probe timeout is rejected.
///
/// **WHY THIS MATTERS**: A zero timeout makes every probe report `Timeout` instantly,
/// which looks exactly like a dead service.
///
/// **BUG THIS CATCHES**: Would catch removal of the positive-timeout check.
#[test]
fn given_zero_probe_timeout_when_building_then_returns_validation_error() {
    // GIVEN: Zero timeout
    let builder = ServiceConfigBuilder::default()
        .with_root_directory("/tmp/tftp_root")
        .with_probe_timeout(Duration::ZERO);

    // WHEN/THEN: Build fails
    assert!(builder.build().is_err());
}

/// **VALUE**: Verifies that a wildcard bind is probed through loopback.
///
/// **WHY THIS MATTERS**: Sending a datagram to `0.0.0.0` is not portable; the probe must
/// target an address a local client can actually reach.
///
/// **BUG THIS CATCHES**: Would catch if `probe_address()` returns the raw bind address.
#[test]
fn given_wildcard_bind_when_probe_address_requested_then_uses_loopback() {
    // GIVEN: Wildcard bind on a custom port
    let config = ServiceConfigBuilder::default()
        .with_root_directory("/tmp/tftp_root")
        .with_bind_address("0.0.0.0")
        .with_port(6969)
        .build()
        .unwrap();

    // WHEN: Asking for the probe address
    let probe = config.probe_address();

    // THEN: Loopback with the same port, bind address unchanged
    assert_eq!(probe, SocketAddr::from((Ipv4Addr::LOCALHOST, 6969)));
    assert_eq!(
        config.socket_address(),
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 6969))
    );
}
