//! JSON output formatting.

use crate::error::ExportResult;
use crate::types::HostResult;

/// Render results as a pretty-printed JSON array.
pub fn render_json(results: &[HostResult]) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
