//! Launch descriptors for external TFTP daemons.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating-system family a candidate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostFamily {
    Unix,
    Windows,
    Any,
}

impl HostFamily {
    /// Family of the host this binary was compiled for.
    pub const fn current() -> Self {
        if cfg!(windows) {
            HostFamily::Windows
        } else {
            HostFamily::Unix
        }
    }
}

impl Default for HostFamily {
    fn default() -> Self {
        HostFamily::Any
    }
}

impl fmt::Display for HostFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostFamily::Unix => "unix",
            HostFamily::Windows => "windows",
            HostFamily::Any => "any",
        };
        write!(f, "{name}")
    }
}

/// One external command that might provide the file-transfer service.
///
/// `args` are templates: `{root}`, `{port}` and `{bind}` are replaced with
/// values from the [`ServiceConfig`](crate::ServiceConfig) at launch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCandidate {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub host: HostFamily,
}

impl BackendCandidate {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: &[&str],
        host: HostFamily,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            host,
        }
    }

    /// Whether this candidate should be tried on `host`.
    pub fn applies_to(&self, host: HostFamily) -> bool {
        match self.host {
            HostFamily::Any => true,
            family => family == host || host == HostFamily::Any,
        }
    }
}
