//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `netsweep scan <subnet>` - Sweep a private subnet for live hosts
//! - `netsweep config [--init]` - Show or initialise settings

mod config;
mod scan;

pub use config::ConfigCommand;
pub use scan::ScanCommand;

use crate::config::AppSettings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// netsweep - LAN host discovery.
///
/// Finds live hosts on a private IPv4 subnet with ICMP echo and the local
/// ARP cache, then optionally probes TCP ports and resolves hostnames.
#[derive(Parser, Debug)]
#[command(name = "netsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discover live hosts on a local subnet", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep a subnet for live hosts
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Show or initialise settings
    #[command(alias = "c")]
    Config(ConfigCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Styled table for the terminal
    #[default]
    Plain,
    /// Fixed-width text report
    Report,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Report => write!(f, "report"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Settings from `--config PATH`, else the default location.
pub fn load_settings(path: Option<&Path>) -> CliResult<AppSettings> {
    let settings = match path {
        Some(path) => AppSettings::load_from(path)?,
        None => AppSettings::load()?,
    };
    Ok(settings)
}
