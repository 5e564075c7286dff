//! Built-in external backends and launch-command construction.

use models::{BackendCandidate, HostFamily, ServiceConfig};

use std::borrow::Cow;
use std::process::Stdio;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tokio::process::Command as TokioCommand;

const PLACEHOLDER_PATTERN: &str = r"\{(?P<key>root|port|bind)\}";
const PLACEHOLDER_CAPTURE: &str = "key";

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex pattern"))
}

/// Default candidates for every host family, in priority order.
///
/// `dnsmasq` always answers TFTP on the standard port; `{port}` is not passed to it.
pub fn default_candidates() -> Vec<BackendCandidate> {
    vec![
        BackendCandidate::new(
            "dnsmasq",
            "dnsmasq",
            &[
                "--keep-in-foreground",
                "--port=0",
                "--enable-tftp",
                "--tftp-root={root}",
                "--listen-address={bind}",
                "--bind-interfaces",
            ],
            HostFamily::Unix,
        ),
        BackendCandidate::new(
            "atftpd",
            "atftpd",
            &["--daemon", "--no-fork", "--bind-address", "{bind}", "--port", "{port}", "{root}"],
            HostFamily::Unix,
        ),
        BackendCandidate::new(
            "tftp-hpa",
            "in.tftpd",
            &["--listen", "--foreground", "--address", "{bind}:{port}", "--secure", "{root}"],
            HostFamily::Unix,
        ),
        BackendCandidate::new("tftpy", "python", &["-m", "tftpy"], HostFamily::Windows),
    ]
}

/// Candidates from `candidates` that apply to `host`, order preserved.
pub fn candidates_for(candidates: &[BackendCandidate], host: HostFamily) -> Vec<&BackendCandidate> {
    candidates.iter().filter(|c| c.applies_to(host)).collect()
}

/// Replace `{root}`, `{port}` and `{bind}` in one argument template.
pub fn expand_arg<'a>(template: &'a str, config: &ServiceConfig) -> Cow<'a, str> {
    get_placeholder_regex().replace_all(template, |caps: &Captures| {
        match caps.name(PLACEHOLDER_CAPTURE).map(|m| m.as_str()) {
            Some("root") => config.root_directory().display().to_string(),
            Some("port") => config.port().to_string(),
            Some("bind") => config.bind_address().to_string(),
            _ => caps[0].to_string(),
        }
    })
}

/// Expanded argument list for `candidate`.
pub fn expand_args(candidate: &BackendCandidate, config: &ServiceConfig) -> Vec<String> {
    candidate
        .args
        .iter()
        .map(|arg| expand_arg(arg, config).into_owned())
        .collect()
}

/// Printable command line, for logs and attempt history.
pub fn render_command(candidate: &BackendCandidate, config: &ServiceConfig) -> String {
    let mut parts = vec![candidate.program.clone()];
    parts.extend(expand_args(candidate, config));
    parts.join(" ")
}

/// Detached launch command: streams suppressed, working directory at the service root.
pub(crate) fn build_launch_command(
    candidate: &BackendCandidate,
    config: &ServiceConfig,
) -> TokioCommand {
    let mut cmd = TokioCommand::new(&candidate.program);
    cmd.args(expand_args(candidate, config))
        .current_dir(config.root_directory())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false);

    // Own process group so a terminal Ctrl-C reaches only the supervisor,
    // which then tears the daemon down itself.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}
