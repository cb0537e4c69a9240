//! ICMP echo through the system `ping` utility.
//!
//! Unprivileged processes can't open raw ICMP sockets on most platforms, so
//! the sweep shells out to `ping` with a single echo request and trusts its
//! exit status. The child is not killed if the sweep stops; it exits on its
//! own once its deadline passes.

use super::traits::Pinger;
use crate::error::{ScanError, ScanResult};
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Extra time granted to the `ping` process beyond its own deadline.
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// Pings hosts with the operating system's `ping` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPinger;

impl SystemPinger {
    pub fn new() -> Self {
        Self
    }
}

/// Arguments for a single echo request with the given deadline.
fn ping_args(addr: Ipv4Addr, deadline: Duration) -> Vec<String> {
    let millis = deadline.as_millis().max(1);

    #[cfg(target_os = "windows")]
    let args = vec!["-n".to_string(), "1".to_string(), "-w".to_string(), millis.to_string()];

    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    let args = vec!["-c".to_string(), "1".to_string(), "-W".to_string(), millis.to_string()];

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd"
    )))]
    let args = {
        // Linux takes whole seconds.
        let secs = millis.div_ceil(1000).max(1);
        vec!["-c".to_string(), "1".to_string(), "-W".to_string(), secs.to_string()]
    };

    let mut args = args;
    args.push(addr.to_string());
    args
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(&self, addr: Ipv4Addr, deadline: Duration) -> ScanResult<bool> {
        let mut command = Command::new("ping");
        command
            .args(ping_args(addr, deadline))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let limit = deadline + PROCESS_GRACE;
        let status = timeout(limit, command.status())
            .await
            .map_err(|_| ScanError::Timeout(limit.as_millis() as u64))?
            .map_err(|e| ScanError::CommandFailed {
                command: "ping".to_string(),
                reason: e.to_string(),
            })?;

        Ok(status.success())
    }
}
