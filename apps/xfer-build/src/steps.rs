//! npm steps run against the project root.
//!
//! Every step is an external command with inherited stdio; only its exit
//! status matters. A missing executable is reported as status 1.

use crate::error::BuildError;

use common::ErrorLocation;

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use clap::ValueEnum;
use log::{error, info};
use tokio::process::Command as TokioCommand;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

pub const PACKAGE_JSON: &str = "package.json";

/// Package manager executable for the host.
pub const fn package_manager() -> &'static str {
    if cfg!(windows) { "npm.cmd" } else { "npm" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PackageTarget {
    Win,
    Linux,
    All,
}

impl PackageTarget {
    /// Target matching the running OS.
    pub fn host() -> Self {
        if cfg!(windows) {
            PackageTarget::Win
        } else {
            PackageTarget::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageTarget::Win => "win",
            PackageTarget::Linux => "linux",
            PackageTarget::All => "all",
        }
    }
}

impl fmt::Display for PackageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    CheckToolchain,
    Install,
    BuildAssets,
    Run { dev: bool },
    Package(PackageTarget),
}

impl BuildStep {
    /// Arguments passed to the package manager.
    pub fn args(&self) -> Vec<String> {
        match self {
            BuildStep::CheckToolchain => vec![String::from("--version")],
            BuildStep::Install => vec![String::from("ci")],
            BuildStep::BuildAssets => vec![String::from("run"), String::from("build")],
            BuildStep::Run { dev: false } => vec![String::from("run"), String::from("electron")],
            BuildStep::Run { dev: true } => {
                vec![String::from("run"), String::from("electron:dev")]
            }
            BuildStep::Package(target) => vec![
                String::from("run"),
                format!("electron:build:{target}"),
            ],
        }
    }

    pub fn description(&self) -> String {
        match self {
            BuildStep::CheckToolchain => String::from("Checking npm installation"),
            BuildStep::Install => String::from("Installing dependencies"),
            BuildStep::BuildAssets => String::from("Building web assets"),
            BuildStep::Run { dev: false } => String::from("Starting Electron app"),
            BuildStep::Run { dev: true } => String::from("Starting Electron app (dev mode)"),
            BuildStep::Package(target) => format!("Packaging for {target}"),
        }
    }
}

/// Runs [`BuildStep`]s in a validated npm project.
#[derive(Debug, Clone)]
pub struct StepRunner {
    project_root: PathBuf,
    program: String,
}

impl StepRunner {
    /// Runner for `project_root`, which must contain `package.json`.
    #[track_caller]
    pub fn new(project_root: &Path) -> Result<Self, BuildError> {
        if !project_root.join(PACKAGE_JSON).is_file() {
            return Err(BuildError::Project {
                message: format!(
                    "{PACKAGE_JSON} not found in {}",
                    project_root.display()
                ),
                location: ErrorLocation::from(std::panic::Location::caller()),
            });
        }

        Ok(Self {
            project_root: project_root.to_path_buf(),
            program: package_manager().to_string(),
        })
    }

    /// Use a different executable in place of npm.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run one step and return its exit status.
    pub async fn run(&self, step: BuildStep) -> i32 {
        if step == BuildStep::CheckToolchain {
            return self.check_toolchain().await;
        }

        let args = step.args();
        info!("{}", step.description());
        info!("Running: {} {}", self.program, args.join(" "));

        let status = self
            .command(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await;

        match status {
            Ok(status) => match status.code() {
                Some(code) => code,
                None => {
                    error!("{} terminated by a signal", self.program);
                    EXIT_FAILURE
                }
            },
            Err(e) => {
                self.report_spawn_error(&e);
                EXIT_FAILURE
            }
        }
    }

    /// `npm --version` with captured output; logs the version on success.
    pub async fn check_toolchain(&self) -> i32 {
        info!("{}", BuildStep::CheckToolchain.description());

        let output = self
            .command(&BuildStep::CheckToolchain.args())
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                info!("npm version: {}", version.trim());
                EXIT_SUCCESS
            }
            Ok(output) => {
                error!(
                    "{} --version failed ({}). Please install Node.js and npm first",
                    self.program, output.status
                );
                EXIT_FAILURE
            }
            Err(e) => {
                self.report_spawn_error(&e);
                EXIT_FAILURE
            }
        }
    }

    fn command(&self, args: &[String]) -> TokioCommand {
        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(args)
            .current_dir(&self.project_root)
            .kill_on_drop(true);
        cmd
    }

    fn report_spawn_error(&self, e: &std::io::Error) {
        if e.kind() == ErrorKind::NotFound {
            error!(
                "Command not found: {}. Make sure Node.js and npm are installed",
                self.program
            );
        } else {
            error!("Failed to run {}: {e}", self.program);
        }
    }
}
