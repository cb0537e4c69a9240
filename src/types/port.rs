//! Port types for the optional per-host TCP sweep.
//!
//! `Port` guarantees a usable port number (1-65535). `PortSpec` parses the
//! user-facing port list ("80", "22,80,443", "8000-8010", "common") into
//! the ordered, deduplicated set a scan request carries.

use crate::services::COMMON_PORTS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated TCP port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a new Port, returning None for port 0.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port == 0 {
            None
        } else {
            Some(Self(port))
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An ordered, deduplicated set of ports to probe on every active host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSpec {
    ports: Vec<Port>,
}

impl PortSpec {
    /// Keyword that expands to [`COMMON_PORTS`].
    pub const COMMON_KEYWORD: &'static str = "common";

    /// Build a spec from arbitrary ports; order and duplicates are normalized.
    pub fn from_ports(ports: impl IntoIterator<Item = Port>) -> Self {
        let mut ports: Vec<Port> = ports.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        Self { ports }
    }

    /// The well-known service ports probed by default.
    pub fn common() -> Self {
        Self::from_ports(COMMON_PORTS.iter().filter_map(|&p| Port::new(p)))
    }

    /// Ports in ascending order.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    /// Consume the set, returning the sorted ports.
    pub fn into_ports(self) -> Vec<Port> {
        self.ports
    }

    /// Number of unique ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

fn parse_port(s: &str) -> Result<Port, PortError> {
    let s = s.trim();
    let value: u16 = s
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
    Port::new(value).ok_or(PortError::OutOfRange(value))
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut ports = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case(Self::COMMON_KEYWORD) {
                ports.extend(Self::common().into_ports());
            } else if let Some((start, end)) = part.split_once('-') {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    return Err(PortError::InvalidRange(start.0, end.0));
                }
                ports.extend((start.0..=end.0).map(Port));
            } else {
                ports.push(parse_port(part)?);
            }
        }

        if ports.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(Self::from_ports(ports))
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
