//! Per-model repair reports.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csp_slicer::EventName;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::RepairMode;
use crate::error::Result;

/// Hex-encoded SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// What happened to one (assertion, event) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The replacement was spliced into the working model.
    Applied {
        /// Whether the region text was unique in the working model.
        unique: bool,
        continuation_replaced: bool,
    },
    /// The event had no region in the working model.
    RegionNotFound,
    /// The oracle produced no usable answer.
    OracleFailed { error: String },
    /// The answer would have broken the model's structure.
    Rejected { reason: String },
}

impl AttemptOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, AttemptOutcome::Applied { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Applied { .. } => "applied",
            AttemptOutcome::RegionNotFound => "region_not_found",
            AttemptOutcome::OracleFailed { .. } => "oracle_failed",
            AttemptOutcome::Rejected { .. } => "rejected",
        }
    }
}

/// One unit of work in a repair pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairAttempt {
    pub assertion: String,
    pub event: EventName,
    /// Rule the oracle was given, by name.
    pub rule: String,
    pub outcome: AttemptOutcome,
}

/// Summary of one model's repair pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairReport {
    pub run_id: Uuid,
    pub model: PathBuf,
    pub oracle: String,
    pub mode: RepairMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_sha256: String,
    pub output_sha256: String,
    /// Failure records applied to this model, in order.
    pub assertions: Vec<String>,
    pub attempts: Vec<RepairAttempt>,
}

impl RepairReport {
    pub fn applied(&self) -> usize {
        self.attempts.iter().filter(|a| a.outcome.is_applied()).count()
    }

    /// Whether the repaired text differs from the input.
    pub fn changed(&self) -> bool {
        self.input_sha256 != self.output_sha256
    }

    pub fn count(&self, label: &str) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome.label() == label)
            .count()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }
}
