//! TCP connect port probing.
//!
//! A port counts as open only when the three-way handshake completes inside
//! the timeout. Refusals, timeouts and socket errors all read as "closed";
//! none of them are reported to the caller.

use super::traits::PortProber;
use crate::services::service_label;
use crate::types::{OpenPort, Port};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Probes ports with plain `connect()` calls. No privileges required.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnectProber;

impl TcpConnectProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortProber for TcpConnectProber {
    async fn probe_port(&self, addr: Ipv4Addr, port: u16, limit: Duration) -> bool {
        let target = SocketAddr::from((addr, port));
        match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                trace!(%target, error = %e, "connect failed");
                false
            }
            Err(_) => {
                trace!(%target, "connect timed out");
                false
            }
        }
    }
}

/// Sweeps a host's port plan and labels the open ports.
#[derive(Clone)]
pub struct PortScanner {
    prober: Arc<dyn PortProber>,
    timeout: Duration,
}

impl PortScanner {
    pub fn new(prober: Arc<dyn PortProber>, timeout: Duration) -> Self {
        Self { prober, timeout }
    }

    /// Probe `ports` in order; the result keeps that order.
    pub async fn scan(&self, addr: Ipv4Addr, ports: &[Port]) -> Vec<OpenPort> {
        let mut open = Vec::new();
        for port in ports.iter().map(|p| p.as_u16()) {
            // Bound the capability as well in case it ignores `timeout`.
            let probe = self.prober.probe_port(addr, port, self.timeout);
            if let Ok(true) = timeout(self.timeout * 2, probe).await {
                open.push(OpenPort::new(port, service_label(port)));
            }
        }
        open
    }
}
