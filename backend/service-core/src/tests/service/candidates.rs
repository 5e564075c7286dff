// Unit tests for candidate templates and filtering

use crate::service::candidates::{
    build_launch_command, candidates_for, default_candidates, expand_arg, get_placeholder_regex,
    render_command,
};

use models::{BackendCandidate, HostFamily, ServiceConfig};

fn config() -> ServiceConfig {
    ServiceConfig::builder()
        .with_root_directory("/srv/tftp")
        .with_bind_address("10.0.0.5")
        .with_port(6969)
        .build()
        .unwrap()
}

/// **VALUE**: Verifies every placeholder is substituted, including several in one argument.
///
/// **WHY THIS MATTERS**: `in.tftpd --address {bind}:{port}` packs two values into one
/// argument. A partial substitution would launch the daemon on a literal `{port}`.
///
/// **BUG THIS CATCHES**: Would catch `replace` instead of `replace_all`, or a missing key.
#[test]
fn given_template_with_multiple_placeholders_when_expanded_then_all_are_replaced() {
    // GIVEN: Config and a compound template
    let config = config();

    // WHEN: Expanding
    let expanded = expand_arg("{bind}:{port}", &config);
    let root = expand_arg("--tftp-root={root}", &config);

    // THEN: Concrete values
    assert_eq!(expanded, "10.0.0.5:6969");
    assert_eq!(root, "--tftp-root=/srv/tftp");
}

/// **VALUE**: Verifies unknown braces pass through untouched.
///
/// **WHY THIS MATTERS**: Shell snippets in custom candidates (`sh -c '... ${x}'`) must not be
/// mangled.
///
/// **BUG THIS CATCHES**: Would catch an over-broad placeholder pattern.
#[test]
fn given_unknown_placeholder_when_expanded_then_left_verbatim() {
    let config = config();
    assert_eq!(expand_arg("{user}-${HOME}", &config), "{user}-${HOME}");
    assert!(get_placeholder_regex().is_match("{root}"));
    assert!(!get_placeholder_regex().is_match("{rootdir}"));
}

/// **VALUE**: Verifies the built-in chain order per host family.
///
/// **WHY THIS MATTERS**: Priority order is part of the service contract: dnsmasq first, then
/// atftpd on Unix; tftpy on Windows.
///
/// **BUG THIS CATCHES**: Would catch reordering of the default table or a filter that lets
/// Windows candidates leak onto Unix hosts.
#[test]
fn given_default_candidates_when_filtered_per_host_then_priority_order_holds() {
    // GIVEN: The built-in table
    let defaults = default_candidates();

    // WHEN: Filtering for each host
    let unix: Vec<&str> = candidates_for(&defaults, HostFamily::Unix)
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    let windows: Vec<&str> = candidates_for(&defaults, HostFamily::Windows)
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    // THEN: Expected order
    assert_eq!(unix, vec!["dnsmasq", "atftpd", "tftp-hpa"]);
    assert_eq!(windows, vec!["tftpy"]);
}

/// **VALUE**: Verifies the launch command uses the candidate's program and the service root.
///
/// **WHY THIS MATTERS**: `python -m tftpy` serves its working directory, so the root must be
/// the child's cwd.
///
/// **BUG THIS CATCHES**: Would catch a command built with the wrong program or cwd.
#[test]
fn given_candidate_when_launch_command_built_then_program_args_and_cwd_match() {
    // GIVEN: A candidate
    let config = config();
    let candidate = BackendCandidate::new(
        "atftpd",
        "atftpd",
        &["--port", "{port}", "{root}"],
        HostFamily::Unix,
    );

    // WHEN: Building
    let cmd = build_launch_command(&candidate, &config);
    let std_cmd = cmd.as_std();

    // THEN: Program, args, cwd
    assert_eq!(std_cmd.get_program(), "atftpd");
    let args: Vec<_> = std_cmd.get_args().collect();
    assert_eq!(args, vec!["--port", "6969", "/srv/tftp"]);
    assert_eq!(
        std_cmd.get_current_dir(),
        Some(std::path::Path::new("/srv/tftp"))
    );
    assert_eq!(
        render_command(&candidate, &config),
        "atftpd --port 6969 /srv/tftp"
    );
}
