// Unit tests for step planning

use crate::cli::Cli;
use crate::steps::{BuildStep, PackageTarget};
use crate::workflow::plan;

use clap::Parser;

fn plan_for(args: &[&str]) -> Vec<BuildStep> {
    let cli = Cli::try_parse_from(std::iter::once("xfer-build").chain(args.iter().copied()))
        .expect("arguments should parse");
    plan(&cli)
}

/// **VALUE**: Verifies the full pipeline order: check, install, build, run.
///
/// **BUG THIS CATCHES**: Would catch a reordered pipeline that runs the app before the
/// assets are built.
#[test]
fn given_default_invocation_when_planned_then_full_pipeline_in_order() {
    assert_eq!(
        plan_for(&[]),
        vec![
            BuildStep::CheckToolchain,
            BuildStep::Install,
            BuildStep::BuildAssets,
            BuildStep::Run { dev: false },
        ]
    );
}

/// **VALUE**: Verifies skip flags remove exactly their step.
///
/// **BUG THIS CATCHES**: Would catch `--skip-build` also dropping the install, or skip
/// flags being ignored in build-only mode.
#[test]
fn given_skip_flags_when_planned_then_only_those_steps_removed() {
    assert_eq!(
        plan_for(&["--skip-install", "--dev"]),
        vec![
            BuildStep::CheckToolchain,
            BuildStep::BuildAssets,
            BuildStep::Run { dev: true },
        ]
    );
    assert_eq!(
        plan_for(&["--build-only", "--skip-build"]),
        vec![BuildStep::CheckToolchain, BuildStep::Install]
    );
}

/// **VALUE**: Verifies packaging builds assets first and run-only does nothing else.
///
/// **WHY THIS MATTERS**: Packaging stale assets ships an old UI.
///
/// **BUG THIS CATCHES**: Would catch a package plan that forgets the build step.
#[test]
fn given_package_and_run_only_modes_when_planned_then_minimal_steps() {
    assert_eq!(
        plan_for(&["--package", "linux"]),
        vec![
            BuildStep::BuildAssets,
            BuildStep::Package(PackageTarget::Linux)
        ]
    );
    assert_eq!(
        plan_for(&["--run-only", "--dev"]),
        vec![BuildStep::Run { dev: true }]
    );
    assert!(plan_for(&["--test-tftp"]).is_empty());
}
