// Unit tests for npm step definitions

use crate::error::BuildError;
use crate::steps::{BuildStep, PACKAGE_JSON, PackageTarget, StepRunner, package_manager};

/// **VALUE**: Pins the npm arguments of every step.
///
/// **WHY THIS MATTERS**: These scripts are the contract with `package.json`; a typo here
/// fails only on a developer machine.
///
/// **BUG THIS CATCHES**: Would catch `npm install` instead of `npm ci`, or a wrong
/// electron script name.
#[test]
fn given_each_step_when_args_built_then_match_npm_scripts() {
    assert_eq!(BuildStep::CheckToolchain.args(), vec!["--version"]);
    assert_eq!(BuildStep::Install.args(), vec!["ci"]);
    assert_eq!(BuildStep::BuildAssets.args(), vec!["run", "build"]);
    assert_eq!(BuildStep::Run { dev: false }.args(), vec!["run", "electron"]);
    assert_eq!(BuildStep::Run { dev: true }.args(), vec!["run", "electron:dev"]);
    assert_eq!(
        BuildStep::Package(PackageTarget::Win).args(),
        vec!["run", "electron:build:win"]
    );
    assert_eq!(
        BuildStep::Package(PackageTarget::All).args(),
        vec!["run", "electron:build:all"]
    );
}

/// **VALUE**: Verifies the package manager and host target follow the running OS.
///
/// **BUG THIS CATCHES**: Would catch `npm` being used on Windows, where only `npm.cmd`
/// can be spawned without a shell.
#[test]
fn given_host_os_when_package_manager_requested_then_matches_platform() {
    if cfg!(windows) {
        assert_eq!(package_manager(), "npm.cmd");
        assert_eq!(PackageTarget::host(), PackageTarget::Win);
    } else {
        assert_eq!(package_manager(), "npm");
        assert_eq!(PackageTarget::host(), PackageTarget::Linux);
    }
}

/// **VALUE**: Verifies a project root without package.json is refused up front.
///
/// **WHY THIS MATTERS**: Running `npm ci` in the wrong directory produces confusing npm
/// errors; a clear message and exit 1 is the documented behavior.
///
/// **BUG THIS CATCHES**: Would catch removal of the package.json check.
#[test]
fn given_directory_without_package_json_when_runner_created_then_project_error() {
    // GIVEN: An empty directory
    let temp = tempfile::tempdir().unwrap();

    // WHEN: Creating a runner
    let result = StepRunner::new(temp.path());

    // THEN: Project error mentioning package.json
    match result {
        Err(BuildError::Project { message, .. }) => assert!(message.contains(PACKAGE_JSON)),
        other => panic!("Expected Project error, got {other:?}"),
    }
}

/// **VALUE**: Verifies a valid project gets the host package manager by default.
#[test]
fn given_npm_project_when_runner_created_then_uses_package_manager() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join(PACKAGE_JSON), "{}").unwrap();

    let runner = StepRunner::new(temp.path()).unwrap();

    assert_eq!(runner.program(), package_manager());
    assert_eq!(runner.project_root(), temp.path());
    assert_eq!(runner.with_program("pnpm").program(), "pnpm");
}
