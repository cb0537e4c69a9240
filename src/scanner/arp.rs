//! Passive host detection through the local ARP cache.
//!
//! The cache is captured once per sweep by running `arp -a` and parsing its
//! output. Both the BSD/Linux layout
//!
//! ```text
//! router.lan (192.168.1.1) at a4:91:b1:0c:22:9f [ether] on eth0
//! ```
//!
//! and the Windows layout
//!
//! ```text
//!   192.168.1.1           a4-91-b1-0c-22-9f     dynamic
//! ```
//!
//! are understood regardless of the host platform.

use super::traits::ArpSource;
use crate::error::{ScanError, ScanResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Snapshot of the IP → MAC cache. Read-only once captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArpTable {
    entries: HashMap<Ipv4Addr, String>,
}

impl ArpTable {
    /// An empty table (used when capture is disabled or fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. The MAC is stored as given.
    pub fn insert(&mut self, addr: Ipv4Addr, mac: impl Into<String>) {
        self.entries.insert(addr, mac.into());
    }

    /// The raw MAC recorded for `addr`, if any.
    pub fn get(&self, addr: &Ipv4Addr) -> Option<&str> {
        self.entries.get(addr).map(String::as_str)
    }

    /// The MAC for `addr` only if it is a complete 48-bit hardware address.
    pub fn hardware_address(&self, addr: &Ipv4Addr) -> Option<&str> {
        self.get(addr).filter(|mac| is_valid_mac(mac))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `arp -a` output.
    ///
    /// Lines without a usable IP/MAC pair, including incomplete entries, are
    /// skipped.
    pub fn parse(output: &str) -> Self {
        output
            .lines()
            .filter_map(|line| parse_unix_line(line).or_else(|| parse_windows_line(line)))
            .collect()
    }
}

impl FromIterator<(Ipv4Addr, String)> for ArpTable {
    fn from_iter<I: IntoIterator<Item = (Ipv4Addr, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// True for exactly twelve hex digits once `:` and `-` separators are removed.
pub fn is_valid_mac(mac: &str) -> bool {
    let digits: String = mac.chars().filter(|c| *c != ':' && *c != '-').collect();
    digits.len() == 12 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a MAC into lowercase, colon-separated, zero-padded octets.
///
/// macOS prints octets without leading zeros (`0:1b:2c:3:4d:5e`), which is
/// why octets of one digit are accepted.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let octets: Vec<&str> = raw.split([':', '-']).collect();
    if octets.len() != 6 {
        return None;
    }

    let mut normalized = Vec::with_capacity(6);
    for octet in octets {
        if octet.is_empty() || octet.len() > 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        normalized.push(format!("{:0>2}", octet.to_ascii_lowercase()));
    }
    Some(normalized.join(":"))
}

fn parse_unix_line(line: &str) -> Option<(Ipv4Addr, String)> {
    let open = line.find('(')?;
    let close = open + line[open..].find(')')?;
    let addr: Ipv4Addr = line[open + 1..close].trim().parse().ok()?;

    let rest = &line[close + 1..];
    let at = rest.find(" at ")?;
    let mac = rest[at + 4..].split_whitespace().next()?;
    normalize_mac(mac).map(|mac| (addr, mac))
}

fn parse_windows_line(line: &str) -> Option<(Ipv4Addr, String)> {
    let mut parts = line.split_whitespace();
    let addr: Ipv4Addr = parts.next()?.parse().ok()?;
    let mac = parts.next()?;
    normalize_mac(mac).map(|mac| (addr, mac))
}

/// Reads the cache with the system `arp` utility.
pub struct SystemArpTable {
    timeout: Duration,
}

impl SystemArpTable {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ArpSource for SystemArpTable {
    async fn capture(&self) -> ScanResult<ArpTable> {
        let mut command = Command::new("arp");
        command.arg("-a").stdin(Stdio::null()).stderr(Stdio::null());

        let output = timeout(self.timeout, command.output())
            .await
            .map_err(|_| ScanError::Timeout(self.timeout.as_millis() as u64))??;

        if !output.status.success() {
            return Err(ScanError::CommandFailed {
                command: "arp -a".to_string(),
                reason: output.status.to_string(),
            });
        }

        let table = ArpTable::parse(&String::from_utf8_lossy(&output.stdout));
        debug!(entries = table.len(), "captured ARP table");
        Ok(table)
    }
}
