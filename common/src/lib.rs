//! Shared building blocks for the QuantumXfer tooling crates.
//!
//! Every error enum in the workspace records where it was raised using
//! [`ErrorLocation`], so log lines point straight at the failing call site.

pub mod error;

pub use error::error_location::ErrorLocation;

#[cfg(test)]
mod tests;
