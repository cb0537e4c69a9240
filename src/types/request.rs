//! Scan requests as submitted by the presentation layer.

use super::{Port, PortSpec};
use serde::{Deserialize, Serialize};

/// Parameters of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Subnet in CIDR notation, e.g. `192.168.1.0/24`.
    pub subnet: String,
    /// Maximum number of hosts probed concurrently.
    pub worker_limit: usize,
    /// Ports to probe on active hosts, ascending.
    #[serde(default)]
    pub ports: Vec<Port>,
    /// Whether active hosts get a TCP port sweep.
    #[serde(default)]
    pub port_scan: bool,
}

impl ScanRequest {
    /// Default worker count.
    pub const DEFAULT_WORKERS: usize = 50;

    /// A host-discovery-only request with the default worker count.
    pub fn new(subnet: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            worker_limit: Self::DEFAULT_WORKERS,
            ports: Vec::new(),
            port_scan: false,
        }
    }

    /// Set the worker limit.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_limit = workers;
        self
    }

    /// Enable port scanning over `spec`.
    pub fn with_ports(mut self, spec: PortSpec) -> Self {
        self.ports = spec.into_ports();
        self.port_scan = true;
        self
    }

    /// Ports that will actually be probed, or `None` when the sweep is off.
    pub fn port_plan(&self) -> Option<&[Port]> {
        if self.port_scan && !self.ports.is_empty() {
            Some(&self.ports)
        } else {
            None
        }
    }
}
