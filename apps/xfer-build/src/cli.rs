//! Command-line surface of `xfer-build`.

use crate::steps::PackageTarget;

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "xfer-build",
    version,
    about = "Build, run and package the QuantumXfer Electron app",
    after_help = "Examples:\n  xfer-build                     install, build and run\n  xfer-build --dev               run with hot reload\n  xfer-build --build-only        install and build, don't run\n  xfer-build --with-tftp         run with a local TFTP service\n  xfer-build --test-tftp         probe a running TFTP service\n  xfer-build --package all       package for every platform"
)]
pub struct Cli {
    /// Skip `npm ci` (dependencies already installed)
    #[arg(long)]
    pub skip_install: bool,

    /// Skip `npm run build` (web assets already built)
    #[arg(long)]
    pub skip_build: bool,

    /// Run with hot reload (`npm run electron:dev`)
    #[arg(long)]
    pub dev: bool,

    /// Install and build, don't run the app
    #[arg(long)]
    pub build_only: bool,

    /// Only run the app; assumes it is already built
    #[arg(long)]
    pub run_only: bool,

    /// Package for distribution; defaults to the host platform
    #[arg(long, value_enum, num_args = 0..=1, value_name = "TARGET")]
    pub package: Option<Option<PackageTarget>>,

    /// Start the TFTP test service for the duration of the run
    #[arg(long)]
    pub with_tftp: bool,

    /// Probe the configured TFTP service and exit
    #[arg(long)]
    pub test_tftp: bool,

    /// Project root containing package.json
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Override the TFTP port from xfer.toml / environment
    #[arg(long)]
    pub tftp_port: Option<u16>,

    /// Override the TFTP root directory
    #[arg(long)]
    pub tftp_root: Option<PathBuf>,

    /// Directory for xfer-build.log
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log at trace level
    #[arg(long, short)]
    pub verbose: bool,
}

/// What a single invocation does. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    TestTftp,
    Package(PackageTarget),
    BuildOnly,
    RunOnly,
    Full,
}

impl Cli {
    /// Resolve the mode flags, most specific first.
    pub fn mode(&self) -> Mode {
        if self.test_tftp {
            Mode::TestTftp
        } else if let Some(target) = self.package {
            Mode::Package(target.unwrap_or_else(PackageTarget::host))
        } else if self.build_only {
            Mode::BuildOnly
        } else if self.run_only {
            Mode::RunOnly
        } else {
            Mode::Full
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Trace
        } else {
            crate::logger::LOG_LEVEL
        }
    }
}
