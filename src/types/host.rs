//! Per-host scan results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Hostname sentinel used when the resolver chain finds nothing usable.
pub const UNKNOWN_HOSTNAME: &str = "Unknown";

/// Which technique established that a host is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// The host answered an ICMP echo request.
    #[serde(rename = "ICMP Ping")]
    Icmp,
    /// The host had a complete entry in the local ARP cache.
    #[serde(rename = "ARP Table")]
    ArpTable,
    /// Not detected.
    None,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icmp => write!(f, "ICMP Ping"),
            Self::ArpTable => write!(f, "ARP Table"),
            Self::None => write!(f, "None"),
        }
    }
}

/// An open TCP port and its well-known service name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
}

impl OpenPort {
    pub fn new(port: u16, service: impl Into<String>) -> Self {
        Self {
            port,
            service: service.into(),
        }
    }
}

impl fmt::Display for OpenPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.port, self.service)
    }
}

/// Outcome of probing a single address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostResult {
    /// The probed address.
    pub address: Ipv4Addr,
    /// Whether any detection method saw the host.
    pub is_active: bool,
    /// Resolved name, or [`UNKNOWN_HOSTNAME`].
    pub hostname: String,
    /// How the host was detected.
    pub detection_method: DetectionMethod,
    /// Open ports in ascending order; empty when port scanning is off.
    pub open_ports: Vec<OpenPort>,
    /// When the probe finished.
    pub timestamp: DateTime<Utc>,
}

impl HostResult {
    /// A host that did not respond to any detection method.
    pub fn inactive(address: Ipv4Addr) -> Self {
        Self {
            address,
            is_active: false,
            hostname: UNKNOWN_HOSTNAME.to_string(),
            detection_method: DetectionMethod::None,
            open_ports: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// A host seen by `method`; hostname and ports are filled in later.
    pub fn active(address: Ipv4Addr, method: DetectionMethod) -> Self {
        Self {
            is_active: true,
            detection_method: method,
            ..Self::inactive(address)
        }
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the open ports.
    pub fn with_open_ports(mut self, open_ports: Vec<OpenPort>) -> Self {
        self.open_ports = open_ports;
        self
    }

    /// True if the resolver found a real name.
    pub fn has_hostname(&self) -> bool {
        self.hostname != UNKNOWN_HOSTNAME
    }
}
