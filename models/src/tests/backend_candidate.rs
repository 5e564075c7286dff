use crate::{BackendCandidate, HostFamily};

/// **VALUE**: Verifies host filtering of candidate descriptors.
///
/// **WHY THIS MATTERS**: The trial chain is one loop over a filtered list. If filtering is
/// wrong, Windows hosts try `dnsmasq` and Unix hosts try `python -m tftpy` first.
///
/// **BUG THIS CATCHES**: Would catch an inverted comparison in `applies_to()`.
#[test]
fn given_platform_specific_candidates_when_filtered_then_only_matching_host_applies() {
    // GIVEN: One candidate per family
    let unix = BackendCandidate::new("atftpd", "atftpd", &["{root}"], HostFamily::Unix);
    let windows = BackendCandidate::new("tftpy", "python", &["-m", "tftpy"], HostFamily::Windows);
    let any = BackendCandidate::new("custom", "tftpd", &[], HostFamily::Any);

    // WHEN/THEN: Filtering for each host
    assert!(unix.applies_to(HostFamily::Unix));
    assert!(!unix.applies_to(HostFamily::Windows));
    assert!(windows.applies_to(HostFamily::Windows));
    assert!(!windows.applies_to(HostFamily::Unix));
    assert!(any.applies_to(HostFamily::Unix));
    assert!(any.applies_to(HostFamily::Windows));
}

/// **VALUE**: Verifies the `new()` convenience keeps argument order.
///
/// **WHY THIS MATTERS**: Daemon flags are positional in places (`atftpd ... <root>`).
///
/// **BUG THIS CATCHES**: Would catch accidental sorting or deduplication of arguments.
#[test]
fn given_argument_slice_when_candidate_created_then_order_is_preserved() {
    // GIVEN/WHEN: A candidate with several args
    let candidate = BackendCandidate::new(
        "atftpd",
        "atftpd",
        &["--port", "{port}", "--port", "{root}"],
        HostFamily::Unix,
    );

    // THEN: Same order, duplicates kept
    assert_eq!(candidate.args, vec!["--port", "{port}", "--port", "{root}"]);
}
