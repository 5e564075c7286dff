//! Immutable settings for one TFTP service instance.

mod builder;

pub use builder::ServiceConfigBuilder;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TFTP_PORT: u16 = 69;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Service settings, validated once by [`ServiceConfigBuilder`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    root_directory: PathBuf,
    bind_address: IpAddr,
    port: u16,
    settle_delay: Duration,
    stop_grace: Duration,
    probe_timeout: Duration,
    allow_in_process: bool,
    verify_bound: bool,
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    pub fn bind_address(&self) -> IpAddr {
        self.bind_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address the service binds to.
    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Address a local client should send to.
    ///
    /// A wildcard bind is reachable through loopback.
    pub fn probe_address(&self) -> SocketAddr {
        let ip = match self.bind_address {
            IpAddr::V4(v4) if v4.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(v6) if v6.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            other => other,
        };
        SocketAddr::new(ip, self.port)
    }

    /// Pause after a successful external spawn before declaring success.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// How long `stop()` waits after a graceful termination request.
    pub fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn allow_in_process(&self) -> bool {
        self.allow_in_process
    }

    pub fn verify_bound(&self) -> bool {
        self.verify_bound
    }
}
