//! # netsweep - LAN host discovery
//!
//! netsweep finds live hosts on a private IPv4 subnet. Each address is
//! checked with an ICMP echo and, failing that, against the local ARP cache.
//! Active hosts can then be probed on a set of TCP ports, and their names
//! are resolved through a fallback chain of system resolver, DNS and
//! `nslookup`.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netsweep::orchestrator::{ScanOrchestrator, ScanSettings};
//! use netsweep::types::{PortSpec, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = ScanOrchestrator::new(ScanSettings::default());
//!     let request = ScanRequest::new("192.168.1.0/24")
//!         .with_workers(64)
//!         .with_ports(PortSpec::common());
//!
//!     scanner.start_scan(request).unwrap();
//!     let status = scanner.wait().await;
//!
//!     println!("{}", status.message);
//!     for host in scanner.results_sorted() {
//!         println!("{} {} {}", host.address, host.hostname, host.detection_method);
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated subnets, ports, requests and host results
//! - [`scanner`] - Probe capabilities and the per-host pipeline
//! - [`orchestrator`] - Scan lifecycle, fan-out and progress tracking
//! - [`output`] - Text report, JSON, CSV and console rendering
//! - [`config`] - Settings file management
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ExportError, ScanError, StartError};
pub use orchestrator::{ScanOrchestrator, ScanSettings, ScanSnapshot, ScanStatus};
pub use types::{DetectionMethod, HostResult, OpenPort, Port, PortSpec, ScanId, ScanRequest};
