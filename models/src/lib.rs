//! Domain models for the QuantumXfer test service.
//!
//! Plain data shared by the supervisor library and the build binary. Nothing in
//! here touches the network or spawns processes.
//!
//! ## Architecture
//!
//! - **models** (this crate): configuration, candidate descriptors, outcomes
//! - **service-core**: supervisor, trial chain, fallback server, probe
//! - **xfer-build**: command-line wiring and the build step runner

pub mod backend_attempt;
pub mod backend_candidate;
pub mod error;
pub mod probe_result;
pub mod service_config;

pub use backend_attempt::{AttemptOutcome, BackendAttempt};
pub use backend_candidate::{BackendCandidate, HostFamily};
pub use probe_result::{ProbeFailure, ProbeResult};
pub use service_config::{ServiceConfig, ServiceConfigBuilder};

#[cfg(test)]
mod tests;
