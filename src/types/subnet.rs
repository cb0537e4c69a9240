//! Subnet specification and host enumeration.
//!
//! Only private IPv4 networks may be swept. A subnet expands into its usable
//! host addresses in numeric order, capped at [`Subnet::MAX_HOSTS`] so that a
//! careless `/16` can't turn into a 65k-host sweep.

use ipnetwork::{IpNetwork, Ipv4Network};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// RFC 1918 ranges that are safe to sweep.
const PRIVATE_RANGES: [(Ipv4Addr, u8); 3] = [
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
];

/// Error type for subnet parsing and policy checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubnetError {
    #[error("invalid CIDR notation: {0}")]
    Invalid(String),
    #[error("{0} is not inside a private address range")]
    NotPrivate(String),
    #[error("IPv6 network {0} is not supported")]
    Ipv6Unsupported(String),
}

/// A validated private IPv4 subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet(Ipv4Network);

impl Subnet {
    /// Hard cap on the number of addresses a single sweep will probe.
    pub const MAX_HOSTS: usize = 254;

    /// Parse a CIDR string and apply the private-range policy.
    ///
    /// Host bits are ignored (`192.168.1.7/24` is `192.168.1.0/24`) and a bare
    /// address is treated as a `/32`.
    pub fn parse(s: &str) -> Result<Self, SubnetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SubnetError::Invalid("empty subnet".to_string()));
        }

        let network: IpNetwork = s.parse().map_err(|_| SubnetError::Invalid(s.to_string()))?;
        let v4 = match network {
            IpNetwork::V4(net) => net,
            IpNetwork::V6(_) => return Err(SubnetError::Ipv6Unsupported(s.to_string())),
        };

        // Normalize away host bits.
        let v4 = Ipv4Network::new(v4.network(), v4.prefix())
            .map_err(|_| SubnetError::Invalid(s.to_string()))?;

        if !is_private(&v4) {
            return Err(SubnetError::NotPrivate(v4.to_string()));
        }

        Ok(Self(v4))
    }

    /// The underlying network.
    pub fn network(&self) -> Ipv4Network {
        self.0
    }

    /// Number of usable host addresses before the cap is applied.
    pub fn usable_host_count(&self) -> usize {
        let size = self.0.size() as usize;
        if self.0.prefix() < 31 {
            size.saturating_sub(2)
        } else {
            size
        }
    }

    /// Expand into candidate host addresses in ascending order.
    ///
    /// Network and broadcast addresses are skipped for prefixes shorter than
    /// /31; the result never exceeds [`Self::MAX_HOSTS`] entries.
    pub fn hosts(&self) -> Vec<Ipv4Addr> {
        let net = self.0;
        let skip_edges = net.prefix() < 31;
        let network_addr = net.network();
        let broadcast = net.broadcast();

        net.iter()
            .filter(|addr| !skip_edges || (*addr != network_addr && *addr != broadcast))
            .take(Self::MAX_HOSTS)
            .collect()
    }
}

impl FromStr for Subnet {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expand a subnet string into the addresses a sweep should probe.
pub fn enumerate(subnet: &str) -> Result<Vec<Ipv4Addr>, SubnetError> {
    Ok(Subnet::parse(subnet)?.hosts())
}

/// True when the whole network lies inside one of the RFC 1918 ranges.
fn is_private(net: &Ipv4Network) -> bool {
    PRIVATE_RANGES.iter().any(|&(base, prefix)| {
        Ipv4Network::new(base, prefix)
            .map(|range| net.prefix() >= prefix && range.contains(net.network()))
            .unwrap_or(false)
    })
}
