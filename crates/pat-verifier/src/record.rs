//! Failure records exchanged between the verifier and the repair pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Verdict of a reported assertion. Only failures are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStatus {
    #[default]
    Failed,
}

/// One failed assertion.
///
/// Record order is the verifier's report order and is significant: later
/// repairs see the effects of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub assertion: String,
    #[serde(default)]
    pub status: FailureStatus,
    /// Model the assertion failed on; empty means "any model".
    #[serde(rename = "model_file", default)]
    pub source_model: PathBuf,
}

impl FailureRecord {
    pub fn failed(assertion: impl Into<String>, source_model: impl Into<PathBuf>) -> Self {
        Self {
            assertion: assertion.into(),
            status: FailureStatus::Failed,
            source_model: source_model.into(),
        }
    }

    /// Whether this record should be applied when repairing `model`.
    ///
    /// Paths are compared by file name, since traces are written with the
    /// path the checker was given and may be relative to another directory.
    pub fn applies_to(&self, model: &Path) -> bool {
        if self.source_model.as_os_str().is_empty() {
            return true;
        }
        match (self.source_model.file_name(), model.file_name()) {
            (Some(recorded), Some(current)) => recorded == current,
            _ => self.source_model == model,
        }
    }
}

/// Records that apply to `model`, in their original order.
pub fn records_for<'a>(records: &'a [FailureRecord], model: &Path) -> Vec<&'a FailureRecord> {
    records.iter().filter(|r| r.applies_to(model)).collect()
}
