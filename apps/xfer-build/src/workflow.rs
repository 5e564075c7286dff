//! One `xfer-build` invocation: config, optional TFTP service, npm steps.

use crate::cli::{Cli, Mode};
use crate::error::BuildError;
use crate::steps::{BuildStep, EXIT_FAILURE, EXIT_SUCCESS, StepRunner};

use service_core::SAMPLE_FILE_NAME;
use service_core::config::XferConfig;
use service_core::service::{Supervisor, probe};

use common::ErrorLocation;
use models::ServiceConfig;

use std::future::pending;
use std::panic::Location;

use log::{error, info, warn};
use tokio::signal::ctrl_c;

pub const EXIT_INTERRUPTED: i32 = 130;

/// Run the invocation described by `cli` and return the process exit code.
pub async fn run(cli: Cli) -> i32 {
    let runner = match StepRunner::new(&cli.root) {
        Ok(runner) => runner,
        Err(e) => {
            error!("{e}");
            return EXIT_FAILURE;
        }
    };

    match execute(&cli, &runner).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            EXIT_FAILURE
        }
    }
}

/// [`run`] with an explicit step runner.
pub async fn execute(cli: &Cli, runner: &StepRunner) -> Result<i32, BuildError> {
    let project_root = runner.project_root();
    let (config, service_config) = load_service_config(cli, project_root)?;

    let mode = cli.mode();
    if mode == Mode::TestTftp {
        return Ok(test_tftp(&service_config).await);
    }

    let mut supervisor = if cli.with_tftp {
        start_tftp(Supervisor::with_candidates(
            service_config,
            config.candidates(),
        ))
        .await
    } else {
        None
    };

    let steps = plan(cli);

    let code = tokio::select! {
        code = run_steps(runner, &steps) => code,
        _ = interrupted() => {
            warn!("Build cancelled by user");
            EXIT_INTERRUPTED
        }
    };

    if let Some(supervisor) = supervisor.as_mut() {
        supervisor.stop().await;
    }

    Ok(code)
}

/// Steps for the mode selected by `cli`, in execution order.
pub fn plan(cli: &Cli) -> Vec<BuildStep> {
    let install = (!cli.skip_install).then_some(BuildStep::Install);
    let build = (!cli.skip_build).then_some(BuildStep::BuildAssets);

    match cli.mode() {
        Mode::TestTftp => Vec::new(),
        Mode::Package(target) => build
            .into_iter()
            .chain([BuildStep::Package(target)])
            .collect(),
        Mode::BuildOnly => [Some(BuildStep::CheckToolchain), install, build]
            .into_iter()
            .flatten()
            .collect(),
        Mode::RunOnly => vec![BuildStep::Run { dev: cli.dev }],
        Mode::Full => [
            Some(BuildStep::CheckToolchain),
            install,
            build,
            Some(BuildStep::Run { dev: cli.dev }),
        ]
        .into_iter()
        .flatten()
        .collect(),
    }
}

/// Run `steps` in order. A failing intermediate step ends the run with 1;
/// the last step's own status is returned.
pub async fn run_steps(runner: &StepRunner, steps: &[BuildStep]) -> i32 {
    let Some((last, rest)) = steps.split_last() else {
        return EXIT_SUCCESS;
    };

    for step in rest {
        let code = runner.run(*step).await;
        if code != EXIT_SUCCESS {
            error!("{} failed (exit status {code})", step.description());
            return EXIT_FAILURE;
        }
    }

    let code = runner.run(*last).await;
    if code != EXIT_SUCCESS {
        error!("{} failed (exit status {code})", last.description());
    }
    code
}

fn load_service_config(
    cli: &Cli,
    project_root: &std::path::Path,
) -> Result<(XferConfig, ServiceConfig), BuildError> {
    let mut config = XferConfig::load(project_root).map_err(config_error)?;

    if let Some(port) = cli.tftp_port {
        config.tftp.port = port;
    }
    if let Some(root) = &cli.tftp_root {
        config.tftp.root = Some(root.clone());
    }

    let service_config = config
        .service_config(project_root)
        .map_err(config_error)?;

    Ok((config, service_config))
}

#[track_caller]
fn config_error(e: service_core::error::config::ConfigError) -> BuildError {
    BuildError::Config {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

async fn test_tftp(config: &ServiceConfig) -> i32 {
    let address = config.probe_address();
    info!("Testing TFTP server at {address}");

    let result = probe(address, SAMPLE_FILE_NAME, config.probe_timeout()).await;
    if result.success {
        EXIT_SUCCESS
    } else {
        if let Some(reason) = result.failure_reason {
            error!("TFTP test failed: {reason:?}");
        }
        EXIT_FAILURE
    }
}

/// Start the service; an unstartable service is reported and the run continues without it.
async fn start_tftp(mut supervisor: Supervisor) -> Option<Supervisor> {
    match supervisor.start().await {
        Ok(handle) => {
            info!("TFTP service started: {}", handle.describe());
            if let Some(address) = supervisor.local_address() {
                info!(
                    "TFTP root {} available at {address}",
                    supervisor.config().root_directory().display()
                );
            }
            Some(supervisor)
        }
        Err(e) => {
            warn!("Continuing without TFTP service: {e}");
            for attempt in e.attempts() {
                warn!("  {attempt}");
            }
            None
        }
    }
}

/// Resolves on Ctrl-C; never resolves when the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {e}");
        pending::<()>().await;
    }
}
