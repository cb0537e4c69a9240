//! Core type definitions.
//!
//! Newtypes keep subnets, ports and scan identifiers validated from the
//! moment they are parsed.

mod host;
mod port;
mod request;
mod scan_id;
mod subnet;

pub use host::{DetectionMethod, HostResult, OpenPort, UNKNOWN_HOSTNAME};
pub use port::{Port, PortError, PortSpec};
pub use request::ScanRequest;
pub use scan_id::{ScanId, ScanIdError};
pub use subnet::{enumerate, Subnet, SubnetError};
