use std::fmt;

/// Why a single backend attempt did not produce a running service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Executable could not be located. Recoverable; the chain moves on.
    NotFound,
    /// Spawn failed for a reason other than a missing executable.
    SpawnFailed(String),
    /// Process spawned but never bound the service port.
    NotBound,
    /// In-process server could not bind its socket.
    BindFailed(String),
    /// In-process fallback is disabled by configuration.
    Disabled,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::NotFound => write!(f, "executable not found"),
            AttemptOutcome::SpawnFailed(reason) => write!(f, "spawn failed: {reason}"),
            AttemptOutcome::NotBound => write!(f, "process did not bind the service port"),
            AttemptOutcome::BindFailed(reason) => write!(f, "bind failed: {reason}"),
            AttemptOutcome::Disabled => write!(f, "disabled by configuration"),
        }
    }
}

/// History entry for one candidate tried by the trial chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAttempt {
    pub backend: String,
    pub command: String,
    pub outcome: AttemptOutcome,
}

impl BackendAttempt {
    pub fn new(
        backend: impl Into<String>,
        command: impl Into<String>,
        outcome: AttemptOutcome,
    ) -> Self {
        Self {
            backend: backend.into(),
            command: command.into(),
            outcome,
        }
    }
}

impl fmt::Display for BackendAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (`{}`): {}", self.backend, self.command, self.outcome)
    }
}
