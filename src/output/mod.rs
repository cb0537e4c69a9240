//! Output formatting module.
//!
//! Renders sweep results as the fixed-width text report, JSON, CSV, or a
//! styled console table.

mod csv_format;
mod json_format;
mod plain;
pub mod report;

pub use csv_format::render_csv;
pub use json_format::render_json;
pub use plain::{
    print_info, print_plain, print_scan_header, print_success, print_warning,
};
pub use report::{render, ReportLayout};

use crate::cli::OutputFormat;
use crate::error::ExportResult;
use crate::orchestrator::ScanSnapshot;
use crate::types::HostResult;
use chrono::Local;

/// Print `results` to stdout in `format`.
pub fn format_results(
    results: &[HostResult],
    summary: &ScanSnapshot,
    format: OutputFormat,
) -> ExportResult<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(results, summary)?,
        OutputFormat::Report => {
            let layout = layout_for(summary);
            match report::render(results, layout, Local::now().naive_local()) {
                Ok(text) => print!("{}", text),
                Err(crate::error::ExportError::NothingToExport) => {
                    print_info("No active hosts to report.")
                }
                Err(e) => return Err(e),
            }
        }
        OutputFormat::Json => println!("{}", render_json(results)?),
        OutputFormat::Csv => print!("{}", render_csv(results)?),
    }
    Ok(())
}

/// The report layout matching how the sweep was run.
pub fn layout_for(summary: &ScanSnapshot) -> ReportLayout {
    if summary.port_scan {
        ReportLayout::Ports
    } else {
        ReportLayout::DetectionMethod
    }
}

