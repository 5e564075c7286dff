use xfer_build::steps::{BuildStep, EXIT_FAILURE, EXIT_SUCCESS, PACKAGE_JSON, StepRunner};

// ============================================================================
// StepRunner tests
// Standard Unix utilities stand in for npm; only exit statuses matter.
// ============================================================================

fn project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join(PACKAGE_JSON), "{}").unwrap();
    temp
}

/// **VALUE**: Verifies exit statuses pass through unchanged.
///
/// **WHY THIS MATTERS**: The final step's status becomes the tool's exit code; CI relies
/// on it to fail the job.
///
/// **BUG THIS CATCHES**: Would catch statuses being collapsed to 0 or inverted.
#[cfg(unix)]
#[tokio::test]
async fn given_succeeding_and_failing_programs_when_step_run_then_status_passed_through() {
    // GIVEN: Runners backed by `true` and `false`
    let temp = project();
    let ok = StepRunner::new(temp.path()).unwrap().with_program("true");
    let failing = StepRunner::new(temp.path()).unwrap().with_program("false");

    // WHEN/THEN: Status mirrors the program
    assert_eq!(ok.run(BuildStep::Install).await, EXIT_SUCCESS);
    assert_eq!(failing.run(BuildStep::BuildAssets).await, EXIT_FAILURE);
}

/// **VALUE**: Verifies a missing package manager is a failed step, not a crash.
///
/// **WHY THIS MATTERS**: New contributors often run the tool before installing Node.js.
///
/// **BUG THIS CATCHES**: Would catch a spawn error escaping as a panic.
#[tokio::test]
async fn given_missing_program_when_steps_run_then_exit_failure() {
    let temp = project();
    let runner = StepRunner::new(temp.path())
        .unwrap()
        .with_program("xfer-missing-npm-binary");

    assert_eq!(runner.run(BuildStep::Install).await, EXIT_FAILURE);
    assert_eq!(runner.check_toolchain().await, EXIT_FAILURE);
}

/// **VALUE**: Verifies the toolchain check captures output and succeeds on status 0.
///
/// **BUG THIS CATCHES**: Would catch the check treating any output as failure.
#[cfg(unix)]
#[tokio::test]
async fn given_working_program_when_toolchain_checked_then_success() {
    let temp = project();
    let runner = StepRunner::new(temp.path()).unwrap().with_program("echo");

    assert_eq!(runner.run(BuildStep::CheckToolchain).await, EXIT_SUCCESS);
}
