//! Probe capability traits.
//!
//! Every interaction with the operating system (ping, the ARP cache, TCP
//! connects, name lookups) sits behind one of these traits so the sweep logic
//! can run against fakes in tests. Implementations must bound their own
//! blocking time; callers additionally wrap each call in a timeout.

use super::arp::ArpTable;
use crate::error::ScanResult;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;

/// ICMP echo capability.
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Send a single echo request; `Ok(true)` when the host replied.
    async fn ping(&self, addr: Ipv4Addr, timeout: Duration) -> ScanResult<bool>;
}

/// Access to the local address-resolution cache.
#[async_trait]
pub trait ArpSource: Send + Sync {
    /// Take a snapshot of the IP → MAC cache.
    async fn capture(&self) -> ScanResult<ArpTable>;
}

/// TCP reachability of a single port.
#[async_trait]
pub trait PortProber: Send + Sync {
    /// True exactly when a connection to `addr:port` succeeds within `timeout`.
    async fn probe_port(&self, addr: Ipv4Addr, port: u16, timeout: Duration) -> bool;
}

/// Name lookups used by the hostname fallback chain.
///
/// Each method returns the raw candidate name; filtering happens in
/// [`HostnameResolver`](super::resolver::HostnameResolver).
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// Reverse lookup through the system resolver.
    async fn reverse_lookup(&self, addr: Ipv4Addr) -> ScanResult<Option<String>>;

    /// Fully-qualified name from DNS PTR records.
    async fn fqdn_lookup(&self, addr: Ipv4Addr) -> ScanResult<Option<String>>;

    /// Best-effort query through an external name-query utility.
    async fn name_query(&self, addr: Ipv4Addr) -> ScanResult<Option<String>>;
}
