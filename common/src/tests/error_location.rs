use crate::ErrorLocation;

/// **VALUE**: Verifies that `ErrorLocation::caller()` records this file and a real position.
///
/// **WHY THIS MATTERS**: Every service, config and protocol error prints its location.
/// If capture breaks, a failed backend attempt in the log no longer points at the code
/// that produced it.
///
/// **BUG THIS CATCHES**: Would catch if `#[track_caller]` is dropped from `caller()`, which
/// makes every error report the `error_location.rs` constructor instead of the call site.
#[test]
fn given_call_site_when_caller_captured_then_points_at_test_file() {
    // GIVEN/WHEN: Capturing the location here
    let location = ErrorLocation::caller();

    // THEN: File is this test module, line and column are populated
    assert!(
        location.file.contains("tests"),
        "Should capture the test file, got {}",
        location.file
    );
    assert!(location.line > 0, "Should capture a line number");
    assert!(location.column > 0, "Should capture a column number");
}

/// **VALUE**: Verifies the bracketed `[file:line:column]` rendering used in error messages.
///
/// **WHY THIS MATTERS**: Error `Display` strings embed the location verbatim; log scraping
/// and humans both rely on the bracketed shape.
///
/// **BUG THIS CATCHES**: Would catch format drift such as dropping brackets or the column.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_triple() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "service/chain.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting
    let formatted = location.to_string();

    // THEN: Exact shape
    assert_eq!(formatted, "[service/chain.rs:42:7]");
}

/// **VALUE**: Proves location tracking propagates through `#[track_caller]` helpers.
///
/// **WHY THIS MATTERS**: Error constructors are often wrapped in small helpers. Each call
/// site must still get its own line.
///
/// **BUG THIS CATCHES**: Would catch if propagation breaks and all errors collapse onto the
/// helper's line.
#[test]
fn given_tracked_helper_when_called_twice_then_lines_differ() {
    // GIVEN: A tracked helper
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::caller()
    }

    // WHEN: Calling from two consecutive lines
    let first = capture();
    let second = capture();

    // THEN: Same file, consecutive lines
    assert_eq!(first.file, second.file);
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
