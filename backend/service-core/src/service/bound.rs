//! Optional check that a spawned daemon really owns the service port.

use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace, warn};
use netstat2::{AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, get_sockets_info};
use tokio::time::sleep as TokioSleep;

const MIN_VERIFY_WINDOW: Duration = Duration::from_millis(250);
const INITIAL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Whether `pid` currently holds a UDP socket on `port`.
fn owns_udp_port(pid: u32, port: u16) -> bool {
    let sockets = match get_sockets_info(
        AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6,
        ProtocolFlags::UDP,
    ) {
        Ok(sockets) => sockets,
        Err(e) => {
            warn!("Failed to query UDP sockets: {e}");
            return false;
        }
    };

    sockets.iter().any(|s| {
        matches!(s.protocol_socket_info, ProtocolSocketInfo::Udp(ref udp) if udp.local_port == port)
            && s.associated_pids.contains(&pid)
    })
}

/// Poll until `pid` owns `port`, giving up after roughly `window`.
pub(crate) async fn wait_until_bound(pid: u32, port: u16, window: Duration) -> bool {
    let mut backoff = ExponentialBackoff {
        initial_interval: INITIAL_POLL_INTERVAL,
        max_elapsed_time: Some(window.max(MIN_VERIFY_WINDOW)),
        ..Default::default()
    };

    loop {
        if owns_udp_port(pid, port) {
            debug!("PID {pid} is bound to UDP port {port}");
            return true;
        }

        match backoff.next_backoff() {
            Some(duration) => {
                trace!("PID {pid} not bound to {port} yet, retrying after {duration:?}");
                TokioSleep(duration).await;
            }
            None => {
                debug!("PID {pid} never bound UDP port {port}");
                return false;
            }
        }
    }
}
