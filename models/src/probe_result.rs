use std::fmt;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No reply within the caller's timeout.
    Timeout,
    /// A reply arrived but did not start with the DATA opcode.
    MalformedResponse,
    /// The local socket failed to bind, send or receive.
    SocketError,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProbeFailure::Timeout => "timeout",
            ProbeFailure::MalformedResponse => "malformed response",
            ProbeFailure::SocketError => "socket error",
        };
        write!(f, "{text}")
    }
}

/// Outcome of a single read-request probe.
///
/// Exactly one of `responder_address` / `failure_reason` is set, matching `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub success: bool,
    pub responder_address: Option<SocketAddr>,
    pub failure_reason: Option<ProbeFailure>,
}

impl ProbeResult {
    pub fn answered(responder: SocketAddr) -> Self {
        Self {
            success: true,
            responder_address: Some(responder),
            failure_reason: None,
        }
    }

    pub fn failed(reason: ProbeFailure) -> Self {
        Self {
            success: false,
            responder_address: None,
            failure_reason: Some(reason),
        }
    }
}
