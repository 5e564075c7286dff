use common::ErrorLocation;

use thiserror::Error;

/// Errors that stop `xfer-build` before or between steps.
///
/// Step failures are exit codes, not errors; these cover everything around them.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Error from this App
    #[error("Build Error: {message} {location}")]
    Build {
        message: String,
        location: ErrorLocation,
    },

    /// The project root is not an npm project
    #[error("Project Error: {message} {location}")]
    Project {
        message: String,
        location: ErrorLocation,
    },

    /// `xfer.toml`, `.env` or CLI overrides are invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },
}
