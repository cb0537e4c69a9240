//! Fixed-width text report.
//!
//! Two layouts exist: one listing open ports (sweeps that probed ports) and
//! one listing the detection method (plain host discovery). Both keep the
//! column widths of the reports users already diff against.

use crate::error::{ExportError, ExportResult};
use crate::types::HostResult;
use chrono::NaiveDateTime;
use std::fmt::Write;

const NO_HOSTNAME: &str = "No hostname";
const NO_OPEN_PORTS: &str = "No open ports detected";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which columns the report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLayout {
    /// IP, hostname, open ports.
    Ports,
    /// IP, hostname, detection method.
    DetectionMethod,
}

impl ReportLayout {
    /// Default file name for a report generated at `at`.
    pub fn file_name(self, at: NaiveDateTime) -> String {
        let stamp = at.format("%Y%m%d_%H%M%S");
        match self {
            Self::Ports => format!("network_scan_results_{}.txt", stamp),
            Self::DetectionMethod => format!("network_scan_{}.txt", stamp),
        }
    }
}

/// Render `results` in `layout`. Results are written in the order given.
pub fn render(
    results: &[HostResult],
    layout: ReportLayout,
    generated_at: NaiveDateTime,
) -> ExportResult<String> {
    if results.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let stamp = generated_at.format(TIMESTAMP_FORMAT).to_string();
    let mut out = String::new();
    write_layout(&mut out, results, layout, &stamp)?;
    Ok(out)
}

fn write_layout<W: Write>(
    out: &mut W,
    results: &[HostResult],
    layout: ReportLayout,
    stamp: &str,
) -> std::fmt::Result {
    match layout {
        ReportLayout::Ports => write_ports(out, results, stamp),
        ReportLayout::DetectionMethod => write_methods(out, results, stamp),
    }
}

fn display_hostname(host: &HostResult) -> &str {
    if host.has_hostname() {
        &host.hostname
    } else {
        NO_HOSTNAME
    }
}

fn write_ports<W: Write>(
    out: &mut W,
    results: &[HostResult],
    stamp: &str,
) -> std::fmt::Result {
    let rule = "=".repeat(80);
    writeln!(out, "Network Scan Results with Hostnames and Ports - {}", stamp)?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;
    writeln!(out, "Total active hosts: {}", results.len())?;
    writeln!(out)?;
    writeln!(out, "IP Address        Hostname                    Open Ports")?;
    writeln!(out, "{}", "-".repeat(80))?;

    for host in results {
        let ports = if host.open_ports.is_empty() {
            NO_OPEN_PORTS.to_string()
        } else {
            host.open_ports
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        writeln!(
            out,
            "{:<15} {:<25} {}",
            host.address.to_string(),
            display_hostname(host),
            ports
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", rule)
}

fn write_methods<W: Write>(
    out: &mut W,
    results: &[HostResult],
    stamp: &str,
) -> std::fmt::Result {
    let rule = "=".repeat(50);
    writeln!(out, "Network Scan Results - {}", stamp)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Total devices: {}", results.len())?;
    writeln!(out)?;
    writeln!(out, "IP Address       Hostname           Method")?;
    writeln!(out, "{}", "-".repeat(50))?;

    for host in results {
        writeln!(
            out,
            "{:<15} {:<18} {}",
            host.address.to_string(),
            display_hostname(host),
            host.detection_method
        )?;
    }
    Ok(())
}
