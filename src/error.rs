//! Error types for netsweep.
//!
//! Uses `thiserror` for ergonomic error definitions. Only [`StartError`],
//! [`ExportError`] and [`ConfigError`] ever reach a caller; [`ScanError`]
//! describes per-host probe failures, which the scanner logs and collapses
//! into "inactive", "closed" or "Unknown".

use crate::types::SubnetError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single probe against a single host.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for probe operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Reasons a scan could not be started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("Scan already in progress")]
    ScanInProgress,

    #[error("Invalid subnet format: {0}")]
    InvalidSubnet(String),

    #[error("Only private networks allowed: {0}")]
    PolicyRejected(String),

    #[error("Worker limit must be greater than zero")]
    InvalidWorkerLimit,
}

impl StartError {
    /// Stable machine-readable tag for the presentation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScanInProgress => "scan_in_progress",
            Self::InvalidSubnet(_) => "invalid_subnet",
            Self::PolicyRejected(_) => "policy_rejected",
            Self::InvalidWorkerLimit => "invalid_worker_limit",
        }
    }
}

impl From<SubnetError> for StartError {
    fn from(err: SubnetError) -> Self {
        match err {
            SubnetError::Invalid(s) => Self::InvalidSubnet(s),
            SubnetError::NotPrivate(s) => Self::PolicyRejected(s),
            SubnetError::Ipv6Unsupported(s) => {
                Self::PolicyRejected(format!("{} (IPv6 is not supported)", s))
            }
        }
    }
}

/// Errors produced while rendering results.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No results to export")]
    NothingToExport,

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report formatting failed")]
    Format(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Configuration loading and saving errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid configuration format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Umbrella error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Start(#[from] StartError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Port(#[from] crate::types::PortError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI handlers.
pub type CliResult<T> = Result<T, CliError>;
