use crate::{ProbeFailure, ProbeResult};

use std::net::SocketAddr;

/// **VALUE**: Verifies the two constructors keep `success` consistent with the optional fields.
///
/// **WHY THIS MATTERS**: Callers branch on `success` and then read either the responder or
/// the failure reason. A result with `success=true` and a failure reason would be
/// ambiguous.
///
/// **BUG THIS CATCHES**: Would catch a constructor that forgets to clear one of the fields.
#[test]
fn given_constructors_when_building_results_then_fields_are_exclusive() {
    // GIVEN: A responder address
    let responder: SocketAddr = "127.0.0.1:40000".parse().unwrap();

    // WHEN: Building both kinds of result
    let ok = ProbeResult::answered(responder);
    let failed = ProbeResult::failed(ProbeFailure::MalformedResponse);

    // THEN: Exactly one side populated
    assert!(ok.success);
    assert_eq!(ok.responder_address, Some(responder));
    assert_eq!(ok.failure_reason, None);

    assert!(!failed.success);
    assert_eq!(failed.responder_address, None);
    assert_eq!(failed.failure_reason, Some(ProbeFailure::MalformedResponse));
}
