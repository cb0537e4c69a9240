//! Scan subcommand implementation.
//!
//! Handles the `netsweep scan <subnet>` command: starts a sweep, drives a
//! progress bar off the status snapshot, stops on Ctrl-C, then prints and
//! optionally exports the results.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::error::{CliError, CliResult, ExportError};
use crate::orchestrator::{ScanOrchestrator, ScanSettings, ScanSnapshot, ScanStatus};
use crate::output;
use crate::types::{PortSpec, ScanRequest};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// How often the progress bar polls the scan status.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sweep a subnet for live hosts.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Private IPv4 subnet in CIDR notation
    ///
    /// Examples:
    ///   192.168.1.0/24     A typical home LAN
    ///   10.0.0.7/29        Host bits are ignored (10.0.0.0/29)
    ///   172.16.5.20        A single address
    #[arg(value_name = "SUBNET")]
    pub subnet: String,

    /// Probe TCP ports on active hosts (e.g. "80,443", "1-1024", "common").
    /// Without a value the configured default ports are used.
    #[arg(short, long, value_name = "PORTS", num_args = 0..=1)]
    pub ports: Option<Option<String>>,

    /// Maximum number of hosts probed concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// ICMP echo timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub ping_timeout: Option<u64>,

    /// TCP connect timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub port_timeout: Option<u64>,

    /// Don't consult the ARP cache
    #[arg(long)]
    pub no_arp: bool,

    /// Hosts dispatched per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Write the text report to FILE (a timestamped name when omitted)
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let request = self.request(settings)?;
        let orchestrator = ScanOrchestrator::new(self.scan_settings(settings));

        let port_count = request.port_plan().map_or(0, <[_]>::len);
        let id = orchestrator.start_scan(request)?;
        debug!(scan_id = %id, "scan accepted");

        let started = orchestrator.status();
        let interactive = !quiet && self.output == OutputFormat::Plain;
        if interactive {
            output::print_scan_header(&self.subnet, started.total_hosts, port_count);
        }

        let progress = if interactive {
            progress_bar(started.total_hosts as u64)
        } else {
            ProgressBar::hidden()
        };

        let finished = watch(&orchestrator, &progress).await;
        progress.finish_and_clear();

        match finished.status {
            ScanStatus::Stopped if !quiet => output::print_warning(&finished.message),
            ScanStatus::Failed => return Err(CliError::Other(finished.message)),
            _ => {}
        }

        let results = orchestrator.results_sorted();
        output::format_results(&results, &finished, self.output)?;

        if let Some(target) = &self.export {
            self.export(&orchestrator, &finished, target.clone(), quiet)?;
        }

        Ok(())
    }

    fn request(&self, settings: &AppSettings) -> CliResult<ScanRequest> {
        let workers = self.workers.unwrap_or(settings.default_workers);
        let mut request = ScanRequest::new(self.subnet.clone()).with_workers(workers);

        if let Some(spec) = &self.ports {
            let spec = spec.as_deref().unwrap_or(&settings.default_ports);
            let ports: PortSpec = spec.parse()?;
            request = request.with_ports(ports);
        }

        Ok(request)
    }

    fn scan_settings(&self, settings: &AppSettings) -> ScanSettings {
        let mut scan = settings.scan_settings();
        if let Some(ms) = self.ping_timeout {
            scan.ping_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.port_timeout {
            scan.port_timeout = Duration::from_millis(ms);
        }
        if let Some(rate) = self.rate_limit {
            scan.rate_limit = rate;
        }
        if self.no_arp {
            scan.use_arp_table = false;
        }
        scan
    }

    fn export(
        &self,
        orchestrator: &ScanOrchestrator,
        finished: &ScanSnapshot,
        target: Option<PathBuf>,
        quiet: bool,
    ) -> CliResult<()> {
        let text = match orchestrator.export_report() {
            Ok(text) => text,
            Err(ExportError::NothingToExport) => {
                if !quiet {
                    output::print_warning("No active hosts; nothing exported.");
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let path = target.unwrap_or_else(|| {
            PathBuf::from(output::layout_for(finished).file_name(Local::now().naive_local()))
        });
        std::fs::write(&path, text).map_err(ExportError::from)?;

        if !quiet {
            output::print_success(&format!("Report written to {}", path.display()));
        }
        Ok(())
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Poll until the sweep leaves `Running`. The first Ctrl-C stops it.
async fn watch(orchestrator: &ScanOrchestrator, progress: &ProgressBar) -> ScanSnapshot {
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            snapshot = orchestrator.wait() => {
                progress.set_position(snapshot.completed as u64);
                return snapshot;
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                orchestrator.stop_scan();
            }
            _ = ticker.tick() => {
                let snapshot = orchestrator.status();
                progress.set_position(snapshot.completed as u64);
                progress.set_message(format!("{} active", snapshot.active_hosts));
            }
        }
    }
}
