//! TFTP test-service supervision.
//!
//! This module provides functionality for:
//! - Starting a TFTP service from an ordered list of external daemons
//! - Falling back to an in-process server when no daemon is installed
//! - Tearing down whichever backend won, through one [`ServiceHandle`]
//! - Probing a running service with a raw read request
//!
//! # Lifecycle
//!
//! [`Supervisor::start`] seeds the root directory, walks the trial chain and
//! stores the resulting handle. [`Supervisor::stop`] consumes it. Both are
//! idempotent.

mod bound;
pub mod candidates;
pub mod chain;
pub mod fallback;
pub mod handle;
pub mod probe;
pub mod root;
pub mod supervisor;
pub(crate) mod transfer;

pub use handle::{ExternalProcess, HandleId, InProcessTask, ServiceHandle};
pub use probe::probe;
pub use supervisor::Supervisor;
