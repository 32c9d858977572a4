//! Failure-trace files: a JSON array of [`FailureRecord`]s.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::error::Result;
use crate::record::FailureRecord;

/// Default trace file name.
pub const DEFAULT_TRACE_FILE: &str = "mismatch_traces.json";

/// Read a trace. An empty file is an empty trace.
pub fn load_trace(path: &Path) -> Result<Vec<FailureRecord>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<FailureRecord> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), records = records.len(), "loaded failure trace");
    Ok(records)
}

/// Serialize records as a four-space indented JSON array.
pub fn trace_to_string(records: &[FailureRecord]) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write (or replace) a trace. An empty slice writes `[]`, so a stale trace
/// never survives a clean verification.
pub fn write_trace(path: &Path, records: &[FailureRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, trace_to_string(records)?)?;
    info!(path = %path.display(), records = records.len(), "failure trace written");
    Ok(())
}
