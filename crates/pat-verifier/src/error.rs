//! Error types for pat-verifier

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running the model checker
#[derive(Error, Debug)]
pub enum VerifierError {
    /// The checker executable does not exist
    #[error("verifier executable not found at {}", .0.display())]
    Unavailable(PathBuf),

    /// The checker did not finish within its time budget
    #[error("verification of {} timed out after {seconds}s", .model.display())]
    Timeout { model: PathBuf, seconds: u64 },

    /// The checker process could not be started
    #[error("failed to start verifier '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for verifier operations
pub type Result<T> = std::result::Result<T, VerifierError>;
