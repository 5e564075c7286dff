pub mod config;
pub mod error;
pub mod protocol;
pub mod service;

#[cfg(test)]
mod tests;

pub const DEFAULT_ROOT_DIR_NAME: &str = "tftp_root";
pub const SAMPLE_FILE_NAME: &str = "test_file.txt";
pub const SAMPLE_FILE_BODY: &str =
    "QuantumXfer TFTP Test File\nThis file is used for testing TFTP transfers.\n";
pub const README_FILE_NAME: &str = "README.txt";
pub const README_FILE_BODY: &str =
    "TFTP Root Directory\n\nThis directory contains files for TFTP testing.\n";
