// Library exports for testing
// The binary (main.rs) imports these as well

pub mod cli;
pub mod error;
pub mod logger;
pub mod steps;
pub mod workflow;

#[cfg(test)]
mod tests;
