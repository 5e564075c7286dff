use xfer_build::cli::Cli;
use xfer_build::logger::{default_log_dir, initialize as LoggerInitialize};
use xfer_build::workflow::run;

use std::fs::create_dir_all;
use std::process::ExitCode;

use clap::Parser;
use log::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    match create_dir_all(&log_dir) {
        Ok(()) => {
            if let Err(e) = LoggerInitialize(&log_dir, cli.log_level()) {
                eprintln!("{e}");
            }
        }
        Err(e) => eprintln!("Failed to create log directory {}: {e}", log_dir.display()),
    }

    info!("QuantumXfer build starting");
    info!("Log directory: {}", log_dir.display());

    let code = run(cli).await;
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
