//! Domain error types for csp-repair-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a repair of one model file (or the whole command, for
/// configuration problems). Per-region failures are not errors: they are
/// recorded as attempt outcomes in the repair report.
#[derive(Error, Debug)]
pub enum RepairError {
    /// Invalid or inconsistent configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Model file missing or unreadable
    #[error("model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Slicing error
    #[error(transparent)]
    Slice(#[from] csp_slicer::SliceError),

    /// Oracle error
    #[error(transparent)]
    Oracle(#[from] repair_oracle::OracleError),

    /// Verifier error
    #[error(transparent)]
    Verifier(#[from] pat_verifier::VerifierError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for repair operations
pub type Result<T> = std::result::Result<T, RepairError>;
