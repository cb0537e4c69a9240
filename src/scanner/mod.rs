//! Scanner module - per-host probing.
//!
//! Each address goes through the same pipeline: reachability (ICMP, then the
//! ARP cache), a TCP port sweep for active hosts when ports were requested,
//! and finally hostname resolution. The operating-system facing parts live
//! behind the capability traits in [`traits`] and are bundled in a
//! [`ProbeSet`].

pub mod arp;
pub mod icmp;
pub mod rate_limiter;
pub mod reachability;
pub mod resolver;
pub mod tcp;
pub mod traits;

use crate::orchestrator::ScanSettings;
use crate::types::{HostResult, Port};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::debug;

pub use arp::{ArpTable, SystemArpTable};
pub use icmp::SystemPinger;
pub use rate_limiter::RateLimiter;
pub use reachability::{Reachability, ReachabilityProbe};
pub use resolver::{HostnameResolver, SystemNameLookup};
pub use tcp::{PortScanner, TcpConnectProber};
pub use traits::{ArpSource, NameLookup, PortProber, Pinger};

/// The capabilities a sweep runs against.
#[derive(Clone)]
pub struct ProbeSet {
    pub pinger: Arc<dyn Pinger>,
    pub arp: Arc<dyn ArpSource>,
    pub ports: Arc<dyn PortProber>,
    pub names: Arc<dyn NameLookup>,
}

impl ProbeSet {
    /// Capabilities backed by the local system utilities and sockets.
    pub fn system(settings: &ScanSettings) -> Self {
        Self {
            pinger: Arc::new(SystemPinger::new()),
            arp: Arc::new(SystemArpTable::new(settings.arp_timeout)),
            ports: Arc::new(TcpConnectProber::new()),
            names: Arc::new(SystemNameLookup::new(settings.resolve_timeout)),
        }
    }
}

/// Runs the full probe pipeline for one address.
#[derive(Clone)]
pub struct HostProber {
    reachability: ReachabilityProbe,
    port_scanner: PortScanner,
    resolver: HostnameResolver,
}

impl HostProber {
    pub fn new(probes: &ProbeSet, settings: &ScanSettings) -> Self {
        Self {
            reachability: ReachabilityProbe::new(probes.pinger.clone(), settings.ping_timeout),
            port_scanner: PortScanner::new(probes.ports.clone(), settings.port_timeout),
            resolver: HostnameResolver::new(probes.names.clone(), settings.resolve_timeout),
        }
    }

    /// Probe `addr`. Inactive hosts come back without hostname or ports.
    pub async fn probe(&self, addr: Ipv4Addr, arp: &ArpTable, ports: Option<&[Port]>) -> HostResult {
        let verdict = self.reachability.probe(addr, arp).await;
        if !verdict.active {
            return HostResult::inactive(addr);
        }
        debug!(%addr, method = %verdict.method, "host is up");

        let open_ports = match ports {
            Some(plan) => self.port_scanner.scan(addr, plan).await,
            None => Vec::new(),
        };
        let hostname = self.resolver.resolve(addr).await;

        HostResult::active(addr, verdict.method)
            .with_open_ports(open_ports)
            .with_hostname(hostname)
    }
}
