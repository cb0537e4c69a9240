//! Host liveness: ICMP first, the ARP cache second.

use super::arp::ArpTable;
use super::traits::Pinger;
use crate::types::DetectionMethod;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Verdict of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    pub active: bool,
    pub method: DetectionMethod,
}

impl Reachability {
    pub const INACTIVE: Self = Self {
        active: false,
        method: DetectionMethod::None,
    };

    fn detected(method: DetectionMethod) -> Self {
        Self {
            active: true,
            method,
        }
    }
}

/// Decides whether an address is up.
///
/// An ICMP reply always wins. The ARP cache is consulted only when the echo
/// fails, and only complete hardware addresses count. Errors never make a
/// host active.
#[derive(Clone)]
pub struct ReachabilityProbe {
    pinger: Arc<dyn Pinger>,
    timeout: Duration,
}

impl ReachabilityProbe {
    pub fn new(pinger: Arc<dyn Pinger>, timeout: Duration) -> Self {
        Self { pinger, timeout }
    }

    pub async fn probe(&self, addr: Ipv4Addr, arp: &ArpTable) -> Reachability {
        if self.icmp(addr).await {
            return Reachability::detected(DetectionMethod::Icmp);
        }

        if let Some(mac) = arp.hardware_address(&addr) {
            trace!(%addr, mac, "host present in ARP table");
            return Reachability::detected(DetectionMethod::ArpTable);
        }

        Reachability::INACTIVE
    }

    async fn icmp(&self, addr: Ipv4Addr) -> bool {
        // The pinger enforces its own deadline; this outer bound catches
        // implementations that don't.
        let limit = self.timeout * 2;
        match timeout(limit, self.pinger.ping(addr, self.timeout)).await {
            Ok(Ok(replied)) => replied,
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "ping failed");
                false
            }
            Err(_) => {
                debug!(%addr, "ping timed out");
                false
            }
        }
    }
}
