//! Console output.
//!
//! Styled, human-readable rendering for the terminal.

use crate::orchestrator::{ScanSnapshot, ScanStatus};
use crate::types::HostResult;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print the active hosts as a table, followed by the run summary.
pub fn print_plain(results: &[HostResult], summary: &ScanSnapshot) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                   {} Results", style("netsweep").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    if let Some(id) = summary.scan_id {
        writeln!(out, "  {} {}", style("Scan ID:").bold(), style(id.short()).dim())?;
    }
    let status_style = match summary.status {
        ScanStatus::Completed => Style::new().green().bold(),
        ScanStatus::Stopped => Style::new().yellow().bold(),
        ScanStatus::Failed => Style::new().red().bold(),
        ScanStatus::Idle | ScanStatus::Running => Style::new().bold(),
    };
    writeln!(
        out,
        "  {} {}",
        style("Status:").bold(),
        status_style.apply_to(summary.status)
    )?;
    let elapsed = match (summary.started_at, summary.finished_at) {
        (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };
    writeln!(
        out,
        "  {} {} of {} hosts probed in {:.2}s, {} active",
        style("Statistics:").bold(),
        summary.completed,
        summary.total_hosts,
        elapsed,
        style(summary.active_hosts).green().bold()
    )?;
    writeln!(out)?;

    if results.is_empty() {
        writeln!(out, "  {}", style("No active hosts found.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:<15}  {:<24}  {:<10}  {}",
            style("ADDRESS").bold(),
            style("HOSTNAME").bold(),
            style("METHOD").bold(),
            style("OPEN PORTS").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for host in results {
            let hostname = if host.has_hostname() {
                style(truncate_string(&host.hostname, 24))
            } else {
                style(host.hostname.clone()).dim()
            };
            let ports = host
                .open_ports
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");

            writeln!(
                out,
                "  {:<15}  {:<24}  {:<10}  {}",
                host.address.to_string(),
                hostname,
                host.detection_method.to_string(),
                style(ports).green()
            )?;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    writeln!(out)?;
    writeln!(out, "  {}", summary.message)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print a header before the sweep begins.
pub fn print_scan_header(subnet: &str, hosts: usize, ports: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("netsweep").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Subnet: {}", style("•").dim(), style(subnet).white().bold());
    println!(
        "{} Sweeping {} hosts...",
        style("•").dim(),
        style(hosts).white().bold()
    );
    if ports > 0 {
        println!(
            "{} Probing {} ports on each active host",
            style("•").dim(),
            style(ports).white().bold()
        );
    }
    println!();
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate to `max_len` characters, adding an ellipsis if anything was cut.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
