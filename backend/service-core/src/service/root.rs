use crate::error::service::ServiceError;
use crate::{README_FILE_BODY, README_FILE_NAME, SAMPLE_FILE_BODY, SAMPLE_FILE_NAME};

use common::ErrorLocation;

use std::fs::{OpenOptions, create_dir_all};
use std::io::{ErrorKind, Write};
use std::path::Path;

use log::{debug, info};

const SEED_FILES: [(&str, &str); 2] = [
    (SAMPLE_FILE_NAME, SAMPLE_FILE_BODY),
    (README_FILE_NAME, README_FILE_BODY),
];

/// Create the service root if absent and seed the sample files.
///
/// Files that already exist are left untouched, whatever their content.
#[track_caller]
pub fn prepare_root(root: &Path) -> Result<(), ServiceError> {
    create_dir_all(root).map_err(|e| ServiceError::RootSetup {
        message: format!("Failed to create TFTP root {}: {e}", root.display()),
        location: ErrorLocation::caller(),
        source: e,
    })?;

    for (name, body) in SEED_FILES {
        let path = root.join(name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Keeping existing {}", path.display());
                continue;
            }
            Err(e) => {
                return Err(ServiceError::RootSetup {
                    message: format!("Failed to create {}: {e}", path.display()),
                    location: ErrorLocation::caller(),
                    source: e,
                });
            }
        };

        file.write_all(body.as_bytes())
            .map_err(|e| ServiceError::RootSetup {
                message: format!("Failed to write {}: {e}", path.display()),
                location: ErrorLocation::caller(),
                source: e,
            })?;

        debug!("Seeded {}", path.display());
    }

    info!("TFTP root directory: {}", root.display());
    Ok(())
}
