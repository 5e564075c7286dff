//! `xfer.toml` loading for the TFTP test service.
//!
//! Precedence, lowest first: built-in defaults, `xfer.toml`, environment
//! (`XFER_TFTP_PORT`, `XFER_TFTP_ROOT`, optionally from a project `.env`), then
//! whatever the caller applies on top.

use crate::DEFAULT_ROOT_DIR_NAME;
use crate::error::config::ConfigError;
use crate::service::candidates::default_candidates;

use common::ErrorLocation;
use models::service_config::{
    DEFAULT_BIND_ADDRESS, DEFAULT_PROBE_TIMEOUT, DEFAULT_SETTLE_DELAY, DEFAULT_STOP_GRACE,
    DEFAULT_TFTP_PORT,
};
use models::{BackendCandidate, ServiceConfig};

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use const_format::concatcp;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "xfer.toml";
const ENV_FILE_NAME: &str = ".env";
const ENV_PREFIX: &str = "XFER_TFTP_";
pub const ENV_TFTP_PORT: &str = concatcp!(ENV_PREFIX, "PORT");
pub const ENV_TFTP_ROOT: &str = concatcp!(ENV_PREFIX, "ROOT");

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TftpSection {
    /// Service root; relative paths resolve against the project root.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub allow_in_process: bool,
    #[serde(default)]
    pub verify_bound: bool,
    /// Replaces the built-in backend list when present.
    #[serde(default)]
    pub candidates: Option<Vec<BackendCandidate>>,
}

impl Default for TftpSection {
    fn default() -> Self {
        Self {
            root: None,
            bind_address: default_bind_address(),
            port: default_port(),
            settle_delay_ms: default_settle_delay_ms(),
            stop_grace_ms: default_stop_grace_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            allow_in_process: true,
            verify_bound: false,
            candidates: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct XferConfig {
    #[serde(default)]
    pub tftp: TftpSection,
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}
fn default_port() -> u16 {
    DEFAULT_TFTP_PORT
}
fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}
fn default_stop_grace_ms() -> u64 {
    DEFAULT_STOP_GRACE.as_millis() as u64
}
fn default_probe_timeout_ms() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_millis() as u64
}
fn default_true() -> bool {
    true
}

// ============================================
// IMPLEMENTATION
// ============================================

impl XferConfig {
    /// Load `{project_root}/xfer.toml`, then apply environment overrides.
    ///
    /// A missing file yields defaults. A present but broken file is an error.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        load_dotenv(project_root);

        let config_path = project_root.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let config = Self::load_from_path(&config_path)?;
            info!("Config loaded from {}", config_path.display());
            config
        } else {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific file without environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::caller(),
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: XferConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::caller(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `XFER_TFTP_PORT` / `XFER_TFTP_ROOT` from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var(ENV_TFTP_PORT) {
            self.tftp.port = port.trim().parse().map_err(|e| ConfigError::EnvironmentError {
                location: ErrorLocation::caller(),
                variable: ENV_TFTP_PORT.to_string(),
                reason: format!("'{port}' is not a valid port: {e}"),
            })?;
            debug!("{ENV_TFTP_PORT} overrides port: {}", self.tftp.port);
        }

        if let Ok(root) = env::var(ENV_TFTP_ROOT)
            && !root.trim().is_empty()
        {
            debug!("{ENV_TFTP_ROOT} overrides root: {root}");
            self.tftp.root = Some(PathBuf::from(root));
        }

        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tftp.probe_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::caller(),
                reason: String::from("probe_timeout_ms must be greater than zero"),
            });
        }

        if let Some(candidates) = &self.tftp.candidates {
            for candidate in candidates {
                if candidate.name.trim().is_empty() || candidate.program.trim().is_empty() {
                    return Err(ConfigError::ValidationError {
                        location: ErrorLocation::caller(),
                        reason: format!(
                            "Candidate needs a name and a program (got name='{}', program='{}')",
                            candidate.name, candidate.program
                        ),
                    });
                }
            }
        }

        Ok(())
    }

    /// Service root resolved against `project_root`.
    pub fn root_directory(&self, project_root: &Path) -> PathBuf {
        match &self.tftp.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => project_root.join(root),
            None => project_root.join(DEFAULT_ROOT_DIR_NAME),
        }
    }

    /// Build the immutable [`ServiceConfig`] for the supervisor.
    pub fn service_config(&self, project_root: &Path) -> Result<ServiceConfig, ConfigError> {
        ServiceConfig::builder()
            .with_root_directory(self.root_directory(project_root))
            .with_bind_address(self.tftp.bind_address.clone())
            .with_port(self.tftp.port)
            .with_settle_delay(Duration::from_millis(self.tftp.settle_delay_ms))
            .with_stop_grace(Duration::from_millis(self.tftp.stop_grace_ms))
            .with_probe_timeout(Duration::from_millis(self.tftp.probe_timeout_ms))
            .with_allow_in_process(self.tftp.allow_in_process)
            .with_verify_bound(self.tftp.verify_bound)
            .build()
            .map_err(|e| ConfigError::ValidationError {
                location: ErrorLocation::caller(),
                reason: e.to_string(),
            })
    }

    /// Configured backend list, or the built-in one.
    pub fn candidates(&self) -> Vec<BackendCandidate> {
        self.tftp
            .candidates
            .clone()
            .unwrap_or_else(default_candidates)
    }
}

/// Load `{project_root}/.env` into the process environment if it exists.
///
/// Variables already set in the environment win.
fn load_dotenv(project_root: &Path) {
    let env_path = project_root.join(ENV_FILE_NAME);
    if !env_path.exists() {
        return;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => debug!("Loaded environment from {}", env_path.display()),
        Err(e) => warn!("Failed to load {}: {e}", env_path.display()),
    }
}
