//! Configuration management for netsweep.
//!
//! Provides XDG-compliant settings storage and the conversion into the
//! scan engine's [`ScanSettings`](crate::orchestrator::ScanSettings).

mod settings;

pub use settings::{AppSettings, Paths};
