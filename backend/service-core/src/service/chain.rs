//! Ordered backend trial: try each candidate, skip on "not found", stop on success.

use crate::error::service::ServiceError;
use crate::service::bound::wait_until_bound;
use crate::service::candidates::{build_launch_command, candidates_for, render_command};
use crate::service::fallback::{IN_PROCESS_BACKEND, start_in_process};
use crate::service::handle::{ExternalProcess, ServiceHandle};

use common::ErrorLocation;
use models::{AttemptOutcome, BackendAttempt, BackendCandidate, HostFamily, ServiceConfig};

use std::io::ErrorKind;

use log::{debug, info, warn};
use tokio::time::sleep as TokioSleep;

/// Walk `candidates` (filtered for `host`) and return the first backend that starts.
///
/// A successful spawn is success after the settle delay; with `verify_bound` the
/// process must also own the service port, otherwise it is killed and the chain
/// continues. When every external candidate misses, the in-process server is tried.
pub async fn run_chain(
    config: &ServiceConfig,
    candidates: &[BackendCandidate],
    host: HostFamily,
) -> Result<ServiceHandle, ServiceError> {
    let mut attempts = Vec::new();

    for candidate in candidates_for(candidates, host) {
        let command_line = render_command(candidate, config);
        debug!("Trying TFTP backend {}: {command_line}", candidate.name);

        let mut child = match build_launch_command(candidate, config).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} not found, trying next backend", candidate.program);
                attempts.push(BackendAttempt::new(
                    &candidate.name,
                    command_line,
                    AttemptOutcome::NotFound,
                ));
                continue;
            }
            Err(e) => {
                warn!("Failed to spawn {}: {e}", candidate.program);
                attempts.push(BackendAttempt::new(
                    &candidate.name,
                    command_line,
                    AttemptOutcome::SpawnFailed(e.to_string()),
                ));
                return Err(unstartable(attempts));
            }
        };

        TokioSleep(config.settle_delay()).await;

        if config.verify_bound() {
            let pid = child.id().unwrap_or_default();
            if !wait_until_bound(pid, config.port(), config.settle_delay()).await {
                warn!(
                    "{} (PID {pid}) did not bind port {}, discarding",
                    candidate.name,
                    config.port()
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill unbound backend (PID {pid}): {e}");
                }
                attempts.push(BackendAttempt::new(
                    &candidate.name,
                    command_line,
                    AttemptOutcome::NotBound,
                ));
                continue;
            }
        }

        let process = ExternalProcess::new(child, &candidate.name, command_line);
        info!(
            "TFTP backend {} started (PID {})",
            process.backend(),
            process.pid()
        );
        return Ok(ServiceHandle::ExternalProcess(process));
    }

    if !config.allow_in_process() {
        attempts.push(BackendAttempt::new(
            IN_PROCESS_BACKEND,
            IN_PROCESS_BACKEND,
            AttemptOutcome::Disabled,
        ));
        return Err(unstartable(attempts));
    }

    debug!("No external TFTP backend available, starting in-process server");

    match start_in_process(config).await {
        Ok(handle) => Ok(handle),
        Err(e) => {
            attempts.extend(e.attempts().iter().cloned());
            Err(unstartable(attempts))
        }
    }
}

#[track_caller]
fn unstartable(attempts: Vec<BackendAttempt>) -> ServiceError {
    let summary = attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    ServiceError::Unstartable {
        message: format!("No TFTP backend could be started: {summary}"),
        attempts,
        location: ErrorLocation::caller(),
    }
}
