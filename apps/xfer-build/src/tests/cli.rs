// Unit tests for command-line parsing and mode selection

use crate::cli::{Cli, Mode};
use crate::steps::PackageTarget;

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("xfer-build").chain(args.iter().copied()))
        .expect("arguments should parse")
}

/// **VALUE**: Verifies the default invocation runs the full pipeline in the current directory.
///
/// **BUG THIS CATCHES**: Would catch a default mode other than Full or a changed root default.
#[test]
fn given_no_arguments_when_parsed_then_full_mode_in_current_directory() {
    let cli = parse(&[]);

    assert_eq!(cli.mode(), Mode::Full);
    assert_eq!(cli.root, PathBuf::from("."));
    assert!(!cli.with_tftp);
    assert!(cli.tftp_port.is_none());
}

/// **VALUE**: Verifies `--package` works with and without a target.
///
/// **WHY THIS MATTERS**: `--package` alone must package for the host, matching the
/// documented default; an explicit target must win.
///
/// **BUG THIS CATCHES**: Would catch the optional value becoming mandatory, or the host
/// default being lost.
#[test]
fn given_package_flag_with_and_without_target_when_parsed_then_target_resolved() {
    // GIVEN/WHEN: Bare flag and explicit target
    let bare = parse(&["--package"]);
    let explicit = parse(&["--package", "all"]);

    // THEN: Host target vs. explicit
    assert_eq!(bare.mode(), Mode::Package(PackageTarget::host()));
    assert_eq!(explicit.mode(), Mode::Package(PackageTarget::All));
}

/// **VALUE**: Verifies which mode wins when several mode flags are combined.
///
/// **WHY THIS MATTERS**: `--test-tftp` must never kick off an npm build, whatever else is
/// on the command line.
///
/// **BUG THIS CATCHES**: Would catch reordering of the precedence checks.
#[test]
fn given_conflicting_mode_flags_when_parsed_then_most_specific_mode_wins() {
    assert_eq!(
        parse(&["--test-tftp", "--package", "win", "--build-only"]).mode(),
        Mode::TestTftp
    );
    assert_eq!(
        parse(&["--package", "linux", "--build-only", "--run-only"]).mode(),
        Mode::Package(PackageTarget::Linux)
    );
    assert_eq!(parse(&["--build-only", "--run-only"]).mode(), Mode::BuildOnly);
    assert_eq!(parse(&["--run-only", "--dev"]).mode(), Mode::RunOnly);
}

/// **VALUE**: Verifies the TFTP overrides and verbosity reach the parsed struct.
///
/// **BUG THIS CATCHES**: Would catch a renamed flag or a port that silently parses as
/// zero.
#[test]
fn given_tftp_overrides_and_verbose_when_parsed_then_fields_set() {
    let cli = parse(&[
        "--with-tftp",
        "--tftp-port",
        "6969",
        "--tftp-root",
        "/srv/tftp",
        "--root",
        "app",
        "-v",
    ]);

    assert!(cli.with_tftp);
    assert_eq!(cli.tftp_port, Some(6969));
    assert_eq!(cli.tftp_root, Some(PathBuf::from("/srv/tftp")));
    assert_eq!(cli.root, PathBuf::from("app"));
    assert_eq!(cli.log_level(), LevelFilter::Trace);
}

/// **VALUE**: Verifies invalid values are rejected by the parser.
///
/// **BUG THIS CATCHES**: Would catch an unknown package target or an out-of-range port
/// being accepted.
#[test]
fn given_invalid_values_when_parsed_then_rejected() {
    assert!(Cli::try_parse_from(["xfer-build", "--package", "mac"]).is_err());
    assert!(Cli::try_parse_from(["xfer-build", "--tftp-port", "70000"]).is_err());
}
