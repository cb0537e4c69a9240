//! CSV output formatting.

use crate::error::{ExportError, ExportResult};
use crate::types::HostResult;

/// Render results as CSV with a header row. Open ports share one cell,
/// separated by `"; "`.
pub fn render_csv(results: &[HostResult]) -> ExportResult<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(["address", "hostname", "detection_method", "open_ports", "timestamp"])?;

    for host in results {
        let ports = host
            .open_ports
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        wtr.write_record([
            &host.address.to_string(),
            &host.hostname,
            &host.detection_method.to_string(),
            &ports,
            &host.timestamp.to_rfc3339(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
